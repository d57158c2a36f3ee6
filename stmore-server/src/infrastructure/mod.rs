pub(crate) mod database;
pub(crate) mod jwt;
pub(crate) mod logging;
pub(crate) mod mailer;
pub(crate) mod media;
pub(crate) mod settings;
