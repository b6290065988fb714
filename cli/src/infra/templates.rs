//! Embedded provisioning scripts and tier application payloads.
//!
//! At compile time, `include_dir!` embeds everything under `cli/assets/`:
//! `templates/*.tmpl` (provisioning script templates) and `apps/*.ts` (tier
//! application payloads, shipped verbatim). Rendering is pure `{{key}}`
//! text substitution — no control flow, deterministic for identical inputs.

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};

use crate::application::ports::{RenderContext, TemplateEngine};

static EMBEDDED_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

pub struct EmbeddedTemplates;

impl EmbeddedTemplates {
    fn file(path: &str) -> Result<&'static str> {
        EMBEDDED_ASSETS
            .get_file(path)
            .and_then(include_dir::File::contents_utf8)
            .with_context(|| format!("no embedded asset {path}"))
    }
}

impl TemplateEngine for EmbeddedTemplates {
    fn render(&self, name: &str, ctx: &RenderContext) -> Result<String> {
        let template = Self::file(&format!("templates/{name}.tmpl"))?;
        let rendered = substitute(template, ctx);
        anyhow::ensure!(
            !rendered.contains("{{"),
            "template {name} has unresolved placeholders"
        );
        Ok(rendered)
    }

    fn raw(&self, name: &str) -> Result<&str> {
        Self::file(&format!("apps/{name}"))
    }
}

fn substitute(template: &str, ctx: &RenderContext) -> String {
    let mut out = template.to_owned();
    for (key, value) in ctx.iter() {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_every_placeholder() {
        let rendered = EmbeddedTemplates
            .render(
                "mysql_root_setup.sh",
                &RenderContext::new().with("root_password", "s3cret"),
            )
            .expect("render");
        assert!(rendered.contains("s3cret"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn render_fails_on_missing_context_key() {
        let err = EmbeddedTemplates
            .render("mysql_root_setup.sh", &RenderContext::new())
            .expect_err("expected Err");
        assert!(err.to_string().contains("unresolved"), "got: {err}");
    }

    #[test]
    fn render_is_deterministic() {
        let ctx = RenderContext::new().with("server", "mysql-cluster-8.0");
        let first = EmbeddedTemplates
            .render("mysql_apt_config.sh", &ctx)
            .expect("render");
        let second = EmbeddedTemplates
            .render("mysql_apt_config.sh", &ctx)
            .expect("render");
        assert_eq!(first, second);
    }

    #[test]
    fn every_tier_app_payload_is_embedded() {
        for app in ["proxy.ts", "trusted.ts", "gatekeeper.ts"] {
            let source = EmbeddedTemplates.raw(app).expect("payload");
            assert!(!source.is_empty());
        }
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(
            EmbeddedTemplates
                .render("does_not_exist.sh", &RenderContext::new())
                .is_err()
        );
    }
}
