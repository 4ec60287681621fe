//! Icon injector (§4's "Icon injector" row): attaches configured icon
//! metadata to list-tools / list-resource-templates / list-prompts
//! responses.

use std::collections::HashMap;

use crate::protocol::{Icon, ListPromptsResult, ListResourceTemplatesResult, ListToolsResult};

/// Icon assignments keyed by the entry name the icon applies to (tool name,
/// resource-template URI template, or prompt name). A name with no entry
/// here gets no icons appended.
#[derive(Debug, Clone, Default)]
pub struct IconConfig {
    icons: HashMap<String, Vec<Icon>>,
}

impl IconConfig {
    /// An empty configuration; every `apply_*` call becomes a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the icons to attach to `name`.
    pub fn with_icons(mut self, name: impl Into<String>, icons: Vec<Icon>) -> Self {
        self.icons.insert(name.into(), icons);
        self
    }

    fn icons_for(&self, name: &str) -> Option<&[Icon]> {
        self.icons.get(name).map(Vec::as_slice)
    }

    /// Append configured icons to each tool in a `tools/list` result.
    pub fn apply_tools(&self, result: &mut ListToolsResult) {
        for tool in &mut result.tools {
            if let Some(icons) = self.icons_for(&tool.name) {
                tool.icons.extend(icons.iter().cloned());
            }
        }
    }

    /// Append configured icons to each template in a
    /// `resources/templates/list` result.
    pub fn apply_resource_templates(&self, result: &mut ListResourceTemplatesResult) {
        for template in &mut result.resource_templates {
            if let Some(icons) = self.icons_for(&template.uri_template) {
                template.icons.extend(icons.iter().cloned());
            }
        }
    }

    /// Append configured icons to each prompt in a `prompts/list` result.
    pub fn apply_prompts(&self, result: &mut ListPromptsResult) {
        for prompt in &mut result.prompts {
            if let Some(icons) = self.icons_for(&prompt.name) {
                prompt.icons.extend(icons.iter().cloned());
            }
        }
    }
}
