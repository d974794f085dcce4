//! External URLs handed to the gateway and used for browser redirects

use crate::error::{AppError, AppResult, ConfigurationError};
use crate::host::RegistrationLocator;
use crate::plugin::Endpoint;
use reqwest::Url;

#[derive(Debug, Clone)]
pub struct PluginUrls {
    base: Url,
}

impl PluginUrls {
    /// `public_base_url` is the externally reachable root of the host application
    pub fn new(public_base_url: &str) -> AppResult<Self> {
        let mut base = Url::parse(public_base_url).map_err(|e| {
            AppError::from(ConfigurationError::InvalidUrl {
                url: public_base_url.to_string(),
                message: e.to_string(),
            })
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    fn build(&self, path: &str, locator: &RegistrationLocator) -> String {
        let mut url = self.base.clone();
        url.set_path(&format!("{}{}", self.base.path(), path));
        url.query_pairs_mut()
            .clear()
            .append_pair("token", &locator.token.to_string());
        url.to_string()
    }

    /// Absolute URL of one of the plugin's endpoints for a registration
    pub fn endpoint(&self, endpoint: Endpoint, locator: &RegistrationLocator) -> String {
        let path = endpoint.path(locator.event_id, locator.reg_form_id);
        self.build(path.trim_start_matches('/'), locator)
    }

    /// Registration display page of the host
    pub fn registration_page(&self, locator: &RegistrationLocator) -> String {
        let path = format!("event/{}/registrations/{}/", locator.event_id, locator.reg_form_id);
        self.build(&path, locator)
    }
}
