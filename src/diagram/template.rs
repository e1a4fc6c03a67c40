use handlebars::{Handlebars, Helper, HelperResult, Output, RenderContext};
use serde::Serialize;

use super::assembler::{ConnectionDescriptor, ShapeDescriptor};
use crate::error::{Result, Tf2d2Error};

const TEMPLATE_NAME: &str = "d2";

/// Shapes first, then connections, each in the order given
const D2_TEMPLATE: &str = concat!(
    "{{#each shapes}}",
    "{{id}}: {{d2_string label}}",
    "{{#if icon}} {\n  icon: {{icon}}\n}{{/if}}\n",
    "{{/each}}",
    "{{#each connections}}",
    "{{source}} {{arrow}} {{target}}\n",
    "{{/each}}",
);

#[derive(Serialize)]
struct TemplateData<'a> {
    shapes: &'a [ShapeDescriptor],
    connections: &'a [ConnectionDescriptor],
}

/// Renders shape and connection descriptors into d2 script text
pub struct D2Template {
    handlebars: Handlebars<'static>,
}

impl D2Template {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // d2 is not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("d2_string", Box::new(d2_string_helper));
        handlebars
            .register_template_string(TEMPLATE_NAME, D2_TEMPLATE)
            .map_err(|e| Tf2d2Error::Template(e.to_string()))?;

        Ok(Self { handlebars })
    }

    /// Render descriptors to d2 text, without a trailing newline
    pub fn render(
        &self,
        shapes: &[ShapeDescriptor],
        connections: &[ConnectionDescriptor],
    ) -> Result<String> {
        let data = TemplateData {
            shapes,
            connections,
        };

        let rendered = self
            .handlebars
            .render(TEMPLATE_NAME, &data)
            .map_err(|e| Tf2d2Error::Template(e.to_string()))?;

        Ok(rendered.trim_end().to_string())
    }
}

/// Quote a value as a d2 double-quoted string
fn d2_string_helper(
    h: &Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    if let Some(value) = h.param(0).and_then(|v| v.value().as_str()) {
        out.write(&quote(value))?;
    }

    Ok(())
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
