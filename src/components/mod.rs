//! CMS display components
//!
//! Maps content graph types to the components that render them. Content of
//! an unregistered type is rendered by a generic placeholder.

mod form_container;

use std::collections::HashMap;

use crate::models::ContentItem;

pub use form_container::FormContainerSection;

/// A named GraphQL fragment selecting the properties a component renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFragment {
    pub name: &'static str,
    pub definition: &'static str,
}

/// Rendering switches shared by all components
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext {
    /// Emit the attributes the CMS visual editor hooks into
    pub edit_mode: bool,
}

/// A display component for one content type
pub trait CmsComponent: Send + Sync {
    /// Content type this component renders
    fn content_type(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn data_fragment(&self) -> DataFragment;

    fn render(&self, item: &ContentItem, ctx: &RenderContext) -> String;
}

/// Registry of display components keyed by content type
#[derive(Default)]
pub struct ComponentFactory {
    components: HashMap<&'static str, Box<dyn CmsComponent>>,
}

impl ComponentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with every component this site ships
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register(FormContainerSection);
        factory
    }

    pub fn register<C: CmsComponent + 'static>(&mut self, component: C) {
        tracing::debug!(
            content_type = component.content_type(),
            "Registered {}",
            component.display_name()
        );
        self.components
            .insert(component.content_type(), Box::new(component));
    }

    /// Component for the most specific registered type of `item`
    pub fn resolve(&self, item: &ContentItem) -> Option<&dyn CmsComponent> {
        item.types
            .iter()
            .find_map(|t| self.components.get(t.as_str()))
            .map(|c| c.as_ref())
    }

    /// Fragments of all registered components, ordered by name
    pub fn fragments(&self) -> Vec<DataFragment> {
        let mut fragments: Vec<_> = self
            .components
            .values()
            .map(|c| c.data_fragment())
            .collect();
        fragments.sort_by_key(|f| f.name);
        fragments
    }

    pub fn render(&self, item: &ContentItem, ctx: &RenderContext) -> String {
        match self.resolve(item) {
            Some(component) => component.render(item, ctx),
            None => render_unknown(item, ctx),
        }
    }
}

fn render_unknown(item: &ContentItem, ctx: &RenderContext) -> String {
    let name = item.display_name.as_deref().unwrap_or(&item.key);
    let types = if item.types.is_empty() {
        "unknown".to_string()
    } else {
        item.types.join(", ")
    };
    format!(
        "<div class=\"cms-unknown\"{}><div>{}</div><div>Component for type {} not found</div></div>",
        edit_attributes(item, ctx),
        escape_html(name),
        escape_html(&types)
    )
}

/// Attributes that bind an element to its content item in the visual editor
pub(crate) fn edit_attributes(item: &ContentItem, ctx: &RenderContext) -> String {
    if ctx.edit_mode {
        format!(" data-epi-block-id=\"{}\"", escape_html(&item.key))
    } else {
        String::new()
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
