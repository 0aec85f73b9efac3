use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::{debug, info};

use super::{Trigger, Widget};
use crate::browser::{ScrollBehavior, SharedContext};
use crate::events::SignalKind;

const FORM_ID: &str = "contactForm";
const SUCCESS_ID: &str = "form-success-message";

/// Confirmation shown when the form service redirects back with
/// `?success=true`.
pub struct ContactForm {
    context: SharedContext,
}

impl ContactForm {
    pub fn new(context: SharedContext) -> Self {
        Self { context }
    }
}

impl Widget for ContactForm {
    fn name(&self) -> &'static str {
        "contact-form"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::PageContentLoaded]
    }

    fn refresh(self: Arc<Self>, _trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        self.context.with(|ctx| {
            if ctx.document.get_element_by_id(FORM_ID).is_none() {
                debug!("Contact form not found on this page");
                return;
            }
            if ctx.location.query_param("success") != Some("true") {
                return;
            }

            if let Some(form) = ctx.document.get_element_by_id_mut(FORM_ID) {
                form.set_style("display", "none");
            }
            if let Some(message) = ctx.document.get_element_by_id_mut(SUCCESS_ID) {
                message.set_style("display", "block");
                ctx.viewport.scroll_into_view(SUCCESS_ID, ScrollBehavior::Smooth);
            }

            let pathname = ctx.location.pathname().to_string();
            ctx.replace_state(json!({}), &pathname);
            info!("Form submitted successfully");
        });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::testing;

    const PAGE: &str = r#"<main>
        <form id="contactForm" action="https://formsubmit.co/x"><input name="email"></form>
        <div id="form-success-message" style="display: none">Danke!</div>
    </main>"#;

    fn display(context: &SharedContext, id: &str) -> Option<String> {
        context.with_document(|doc| doc.get_element_by_id(id).and_then(|el| el.style("display")))
    }

    #[test]
    fn test_success_redirect_shows_message() {
        let context = testing::context_at(PAGE, "/contact.html?success=true");
        Arc::new(ContactForm::new(context.clone())).refresh(Trigger::Boot);

        assert_eq!(display(&context, FORM_ID).as_deref(), Some("none"));
        assert_eq!(display(&context, SUCCESS_ID).as_deref(), Some("block"));
        context.with(|ctx| {
            assert_eq!(ctx.viewport.scrolled_into_view(), Some(SUCCESS_ID));
            assert_eq!(ctx.location.pathname(), "/contact.html");
            assert_eq!(ctx.location.search(), "");
            assert_eq!(ctx.history.len(), 1);
        });
    }

    #[test]
    fn test_plain_visit_leaves_form_alone() {
        let context = testing::context_at(PAGE, "/contact.html");
        Arc::new(ContactForm::new(context.clone())).refresh(Trigger::Boot);

        assert_eq!(display(&context, FORM_ID), None);
        assert_eq!(display(&context, SUCCESS_ID).as_deref(), Some("none"));
    }

    #[test]
    fn test_other_pages_keep_query() {
        let context = testing::context_at("<main><p>Home</p></main>", "/index.html?success=true");
        Arc::new(ContactForm::new(context.clone())).refresh(Trigger::Boot);
        context.with(|ctx| assert_eq!(ctx.location.search(), "?success=true"));
    }
}
