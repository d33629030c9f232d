pub const DEFAULT_CHANNEL_ID: &str = "al-aziz";
pub const DEFAULT_CHANNEL_NAME: &str = "Default Channel";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 2_000;

pub const DEFAULT_NOTIFICATION_TITLE: &str = "New Notification";
pub const TOKEN_PLACEHOLDER: &str = "Loading token...";

/// Deep link that opens this app's page in the iOS Settings app.
pub const IOS_APP_SETTINGS_URL: &str = "app-settings:";

pub const SETTINGS_PROMPT_TITLE: &str = "Enable Notifications";
pub const SETTINGS_PROMPT_MESSAGE: &str =
    "Notifications are disabled. Please enable them to get the Latest Updates.";
