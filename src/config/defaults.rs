use super::constants::*;

pub(crate) fn log_level() -> Option<String> {
    Some(LOG_LEVEL.to_string())
}

pub(crate) fn endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

pub(crate) fn model() -> String {
    DEFAULT_MODEL.to_string()
}

pub(crate) fn referer() -> Option<String> {
    Some(DEFAULT_REFERER.to_string())
}

pub(crate) fn app_title() -> Option<String> {
    Some(DEFAULT_APP_TITLE.to_string())
}

pub(crate) fn listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}
