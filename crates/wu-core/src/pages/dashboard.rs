//! Promoter dashboard: own tryouts and the applications to each.

use futures::future::join_all;
use wu_client::{Application, ApiError};

use super::tryouts::tryout_card;
use super::{empty_state, render_error, render_into};
use crate::boot::{BootContext, Module};
use crate::dom::escape_html;
use crate::error::BootError;

const LIST_ID: &str = "my-tryouts";

fn application_item(a: &Application) -> String {
    let who = a
        .applicant
        .as_ref()
        .map(|p| p.stage_name.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Unnamed applicant");
    let reel = a
        .reel_link
        .as_deref()
        .filter(|l| l.starts_with("https://") || l.starts_with("http://"))
        .map(|l| format!(r#" <a href="{}" rel="noopener">Reel</a>"#, escape_html(l)))
        .unwrap_or_default();
    format!(
        r#"<li class="application"><strong>{}</strong> <time>{}</time><p>{}</p>{reel}</li>"#,
        escape_html(who),
        escape_html(&a.timestamp),
        escape_html(&a.notes),
    )
}

fn applications_block(result: &Result<Vec<Application>, ApiError>) -> String {
    match result {
        Ok(apps) if apps.is_empty() => empty_state("No applications yet."),
        Ok(apps) => {
            let items: String = apps.iter().map(application_item).collect();
            format!(r#"<ul class="applications">{items}</ul>"#)
        }
        Err(e) => format!(
            r#"<p class="error">Could not load applications. {}</p>"#,
            escape_html(&e.to_string())
        ),
    }
}

/// Lists `/tryouts/mine`, fetching every tryout's applications concurrently.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard;

#[async_trait::async_trait]
impl Module for Dashboard {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        if ctx.document.get_element_by_id(LIST_ID).is_none() {
            return Ok(());
        }
        let api = ctx.api()?;
        let tryouts = match api.my_tryouts().await {
            Ok(t) => t,
            Err(e) => {
                render_error(&mut ctx.document, LIST_ID, "your tryouts", &e);
                return Ok(());
            }
        };
        if tryouts.is_empty() {
            render_into(&mut ctx.document, LIST_ID, &empty_state("You have not posted any tryouts."));
            return Ok(());
        }

        let applications = join_all(tryouts.iter().map(|t| api.list_applications(&t.id))).await;
        let html: String = tryouts
            .iter()
            .zip(&applications)
            .map(|(t, apps)| {
                format!(
                    r#"<section class="dashboard-tryout">{}{}</section>"#,
                    tryout_card(t),
                    applications_block(apps)
                )
            })
            .collect();
        render_into(&mut ctx.document, LIST_ID, &html);
        Ok(())
    }
}
