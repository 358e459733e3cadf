// Header carrying the access token on protected routes
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
// Header carrying the recover token on password reset
pub const RECOVER_TOKEN_HEADER: &str = "x-recover-password-token";

// Token lifetimes, in seconds
pub const ACCESS_TOKEN_TTL_SECS: i64 = 20 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const RECOVER_TOKEN_TTL_SECS: i64 = 30 * 60;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const DEFAULT_MAIL_PORT: u16 = 587;
pub const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 60;

/// Half-width, in minutes, of the window the notification sweep matches against.
pub const NOTIFY_WINDOW_MINUTES: u32 = 2;

pub const RECOVER_EMAIL_SUBJECT: &str = "Password recovery token";
pub const RECOVER_PASSWORD_TEMPLATE: &str = include_str!("../templates/recover_password.html");

pub fn task_notification_subject(task_name: &str) -> String {
    format!("It's time to do your task: {task_name}")
}
