use std::path::Path;

use crate::app::error::{GleanerError, Result};
use crate::config::Config;
use crate::dispatch::{Dispatcher, WebhookSink, WEBHOOK_URL_ENV};
use crate::harvest::Harvester;

pub struct AppContext {
    pub config: Config,
}

impl AppContext {
    /// Load configuration from `path` or the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Config::load(path)?;
        Ok(Self { config })
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn webhook_sink(&self) -> Result<WebhookSink> {
        let endpoint = self.config.sink.endpoint.as_deref().ok_or_else(|| {
            GleanerError::Config(format!(
                "no sink endpoint, set {} or sink.endpoint",
                WEBHOOK_URL_ENV
            ))
        })?;
        WebhookSink::new(endpoint, &self.config.sink)
    }

    /// Validate the configuration and wire a harvester for it.
    pub fn harvester(&self, dispatch: bool, manual: bool) -> Result<Harvester<WebhookSink>> {
        self.config.validate(dispatch)?;

        let dispatcher = if dispatch {
            let sink = self.webhook_sink()?;
            tracing::info!("Dispatching to {}", sink.redacted_endpoint());
            Some(Dispatcher::new(sink, self.config.sink.clone()))
        } else {
            None
        };

        Ok(Harvester::new(self.config.clone(), dispatcher).manual(manual))
    }
}
