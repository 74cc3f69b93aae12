//! Form Container section
//!
//! A structured block to manage form elements on a page. Renders its name,
//! a short description and, when present, its properties as JSON.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::{edit_attributes, escape_html, CmsComponent, DataFragment, RenderContext};
use crate::models::ContentItem;

const COMPONENT_NAME: &str = "Form Container";
const COMPONENT_INFO: &str = "A structured block to manage form elements on a page.";

const FRAGMENT: DataFragment = DataFragment {
    name: "OptiFormsContainerDataData",
    definition: "fragment OptiFormsContainerDataData on OptiFormsContainerData {
  Title
  Description
  ShowSummaryMessageAfterSubmission
  SubmitConfirmationMessage
  ResetConfirmationMessage
}",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FormContainerSection;

impl CmsComponent for FormContainerSection {
    fn content_type(&self) -> &'static str {
        "OptiFormsContainerData"
    }

    fn display_name(&self) -> &'static str {
        COMPONENT_NAME
    }

    fn data_fragment(&self) -> DataFragment {
        FRAGMENT
    }

    fn render(&self, item: &ContentItem, ctx: &RenderContext) -> String {
        let mut html = format!(
            "<div class=\"w-full border-y border-y-solid border-y-slate-900 py-2 mb-4\"{}>\
             <div class=\"font-bold italic\">{}</div><div>{}</div>",
            edit_attributes(item, ctx),
            COMPONENT_NAME,
            COMPONENT_INFO
        );

        let has_properties = item.data.as_object().is_some_and(|o| !o.is_empty());
        if has_properties {
            html.push_str("<pre class=\"w-full overflow-x-hidden font-mono text-sm bg-slate-200 p-2 rounded-sm border border-solid border-slate-900 text-slate-900\">");
            html.push_str(&escape_html(&pretty_json(&item.data)));
            html.push_str("</pre>");
        }

        html.push_str("</div>");
        html
    }
}

/// JSON with four-space indentation
fn pretty_json(value: &serde_json::Value) -> String {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    if value.serialize(&mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(out).unwrap_or_default()
}
