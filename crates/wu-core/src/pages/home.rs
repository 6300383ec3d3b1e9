//! Home page: open tryouts and the talent spotlight.

use super::talent::wrestler_card;
use super::tryouts::tryout_card;
use super::{empty_state, render_error, render_into};
use crate::boot::{BootContext, Module};
use crate::error::BootError;

const TRYOUTS_ID: &str = "home-tryouts";
const TALENT_ID: &str = "home-talent";
const FEATURED_TRYOUTS: usize = 3;
const SPOTLIGHT_SIZE: usize = 4;

/// Fetches both sections concurrently; each renders or fails on its own.
#[derive(Debug, Clone, Copy)]
pub struct Home;

#[async_trait::async_trait]
impl Module for Home {
    fn name(&self) -> &'static str {
        "home"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let api = ctx.api()?;
        let (tryouts, wrestlers) = tokio::join!(api.list_tryouts(), api.list_wrestlers());

        match tryouts {
            Ok(tryouts) => {
                let open: String = tryouts
                    .iter()
                    .filter(|t| t.is_open())
                    .take(FEATURED_TRYOUTS)
                    .map(tryout_card)
                    .collect();
                let html = if open.is_empty() {
                    empty_state("No open tryouts right now.")
                } else {
                    open
                };
                render_into(&mut ctx.document, TRYOUTS_ID, &html);
            }
            Err(e) => render_error(&mut ctx.document, TRYOUTS_ID, "tryouts", &e),
        }

        match wrestlers {
            Ok(wrestlers) => {
                let html: String = wrestlers
                    .iter()
                    .take(SPOTLIGHT_SIZE)
                    .map(|w| wrestler_card(w, &api))
                    .collect();
                render_into(&mut ctx.document, TALENT_ID, &html);
            }
            Err(e) => render_error(&mut ctx.document, TALENT_ID, "talent", &e),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::pages::testing::{context, text};

    const PAGE: &str = r#"<main><section id="home-tryouts"></section><section id="home-talent"></section></main>"#;

    #[tokio::test]
    async fn shows_first_three_open_tryouts_and_four_wrestlers() {
        let server = MockServer::start().await;
        let tryouts: Vec<_> = (1..=6)
            .map(|i| {
                json!({
                    "id": i,
                    "orgName": format!("Promo {i}"),
                    "status": if i == 2 { "closed" } else { "open" }
                })
            })
            .collect();
        let wrestlers: Vec<_> = (1..=6)
            .map(|i| json!({ "handle": format!("w{i}"), "stageName": format!("Wrestler {i}") }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/tryouts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tryouts))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/wrestlers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wrestlers))
            .mount(&server)
            .await;
        let mut ctx = context(&server, PAGE, "/", None).await;

        Home.init(&mut ctx).await.unwrap();

        let shown = text(&ctx, TRYOUTS_ID);
        assert!(shown.contains("Promo 1"));
        assert!(!shown.contains("Promo 2"));
        assert!(shown.contains("Promo 4"));
        assert!(!shown.contains("Promo 5"));

        let spotlight = ctx.document.get_element_by_id(TALENT_ID).unwrap();
        assert_eq!(ctx.document.children(spotlight).len(), 4);
    }

    #[tokio::test]
    async fn one_failing_section_does_not_blank_the_other() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tryouts"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/wrestlers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "stageName": "Solo" }])))
            .mount(&server)
            .await;
        let mut ctx = context(&server, PAGE, "/", None).await;

        Home.init(&mut ctx).await.unwrap();

        assert_eq!(text(&ctx, TRYOUTS_ID), "Could not load tryouts. API 500: db down");
        assert!(text(&ctx, TALENT_ID).contains("Solo"));
    }
}
