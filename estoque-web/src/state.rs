use crate::config::AppConfig;
use crate::gateway::{AgentGateway, ClientFactory};
use crate::selector::DatabaseSelector;
use estoque_agents::ReasoningPolicy;
use handlebars::Handlebars;
use std::sync::Arc;

pub const INDEX_TEMPLATE: &str = "index";

/// Shared, read-only state handed to every request
pub struct AppState {
    pub selector: DatabaseSelector,
    pub gateway: AgentGateway,
    pub templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        factory: Arc<dyn ClientFactory>,
        policy: Arc<ReasoningPolicy>,
    ) -> Result<Self, handlebars::TemplateError> {
        Ok(Self {
            selector: DatabaseSelector::new(&config.storage),
            gateway: AgentGateway::new(config, factory, policy),
            templates: build_templates()?,
        })
    }
}

pub fn build_templates() -> Result<Handlebars<'static>, handlebars::TemplateError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_template_string(INDEX_TEMPLATE, include_str!("../templates/index.hbs"))?;
    Ok(handlebars)
}
