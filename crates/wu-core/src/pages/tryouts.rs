//! Tryout list and tryout detail pages.

use wu_client::{Tryout, TryoutStatus};

use super::{empty_state, render_error, render_into};
use crate::boot::{BootContext, Module};
use crate::dom::escape_html;
use crate::error::BootError;

const LIST_ID: &str = "tryout-list";
const DETAIL_ID: &str = "tryout-detail";

/// Card markup for one tryout.
#[must_use]
pub fn tryout_card(t: &Tryout) -> String {
    let badge = match t.status {
        TryoutStatus::Open => "open",
        TryoutStatus::Closed => "closed",
        TryoutStatus::Other => "other",
    };
    let slots = t
        .slots
        .map(|n| format!(r#"<span class="slots">{n} slots</span>"#))
        .unwrap_or_default();
    let id = escape_html(&urlencoding::encode(&t.id));
    format!(
        r#"<article class="tryout-card" data-tryout-id="{}"><h3>{}</h3><p class="meta">{} · {}</p><span class="badge badge-{badge}">{}</span>{slots}<a href="/tryout.html?id={id}">Details</a></article>"#,
        escape_html(&t.id),
        escape_html(&t.org_name),
        escape_html(&t.city),
        escape_html(&t.date),
        t.status.label(),
    )
}

/// Every published tryout.
#[derive(Debug, Clone, Copy)]
pub struct TryoutList;

#[async_trait::async_trait]
impl Module for TryoutList {
    fn name(&self) -> &'static str {
        "tryout-list"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        if ctx.document.get_element_by_id(LIST_ID).is_none() {
            return Ok(());
        }
        let api = ctx.api()?;
        match api.list_tryouts().await {
            Ok(tryouts) if tryouts.is_empty() => {
                render_into(&mut ctx.document, LIST_ID, &empty_state("No tryouts posted yet."));
            }
            Ok(tryouts) => {
                let html: String = tryouts.iter().map(tryout_card).collect();
                render_into(&mut ctx.document, LIST_ID, &html);
            }
            Err(e) => render_error(&mut ctx.document, LIST_ID, "tryouts", &e),
        }
        Ok(())
    }
}

/// A single tryout, by route parameter or `?id=`.
#[derive(Debug, Clone, Copy)]
pub struct TryoutDetail;

#[async_trait::async_trait]
impl Module for TryoutDetail {
    fn name(&self) -> &'static str {
        "tryout-detail"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        if ctx.document.get_element_by_id(DETAIL_ID).is_none() {
            return Ok(());
        }
        let Some(id) = ctx.page.as_ref().and_then(|p| p.param.clone()) else {
            render_into(&mut ctx.document, DETAIL_ID, &empty_state("No tryout selected."));
            return Ok(());
        };
        let api = ctx.api()?;
        match api.get_tryout(&id).await {
            Ok(t) => {
                let html = format!(
                    r#"{}<section class="requirements"><h4>Requirements</h4><p>{}</p></section>"#,
                    tryout_card(&t),
                    escape_html(&t.requirements)
                );
                render_into(&mut ctx.document, DETAIL_ID, &html);
            }
            Err(e) => render_error(&mut ctx.document, DETAIL_ID, "this tryout", &e),
        }
        Ok(())
    }
}
