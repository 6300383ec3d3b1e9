//! Wrestler directory.

use wu_client::{ApiClient, WrestlerProfile};

use super::{empty_state, render_error, render_into};
use crate::boot::{BootContext, Module};
use crate::dom::escape_html;
use crate::error::BootError;

const LIST_ID: &str = "talent-list";

/// Card markup for one wrestler. Photos resolve through the media base URL.
#[must_use]
pub fn wrestler_card(w: &WrestlerProfile, api: &ApiClient) -> String {
    let photo = w
        .photo_key
        .as_deref()
        .and_then(|key| api.media_url(key))
        .map(|url| {
            format!(
                r#"<img class="avatar" src="{}" alt="{}">"#,
                escape_html(&url),
                escape_html(&w.stage_name)
            )
        })
        .unwrap_or_default();
    let link = w
        .slug()
        .map(|slug| {
            format!(
                r#"<a href="/w/{}">View profile</a>"#,
                escape_html(&urlencoding::encode(slug))
            )
        })
        .unwrap_or_default();
    let gimmicks: String = w
        .gimmicks
        .iter()
        .map(|g| format!(r#"<li class="tag">{}</li>"#, escape_html(g)))
        .collect();
    let gimmicks = if gimmicks.is_empty() {
        gimmicks
    } else {
        format!(r#"<ul class="tags">{gimmicks}</ul>"#)
    };
    format!(
        r#"<article class="wrestler-card">{photo}<h3>{}</h3><p class="meta">{}</p>{gimmicks}{link}</article>"#,
        escape_html(&w.stage_name),
        escape_html(&w.location()),
    )
}

/// Every public wrestler profile.
#[derive(Debug, Clone, Copy)]
pub struct Talent;

#[async_trait::async_trait]
impl Module for Talent {
    fn name(&self) -> &'static str {
        "talent"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        if ctx.document.get_element_by_id(LIST_ID).is_none() {
            return Ok(());
        }
        let api = ctx.api()?;
        match api.list_wrestlers().await {
            Ok(wrestlers) if wrestlers.is_empty() => {
                render_into(&mut ctx.document, LIST_ID, &empty_state("No wrestlers listed yet."));
            }
            Ok(wrestlers) => {
                let html: String = wrestlers.iter().map(|w| wrestler_card(w, &api)).collect();
                render_into(&mut ctx.document, LIST_ID, &html);
            }
            Err(e) => render_error(&mut ctx.document, LIST_ID, "talent", &e),
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

    #[tokio::test]
    async fn directory_renders_cards_with_photos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profiles/wrestlers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [
                {
                    "handle": "kid-lightning",
                    "stageName": "Kid Lightning",
                    "city": "Leeds",
                    "country": "UK",
                    "gimmicks": ["high flyer"],
                    "photoKey": "avatars/kid.jpg"
                },
                { "userId": "sub-2", "stageName": "The Wall" }
            ]})))
            .mount(&server)
            .await;
        let mut ctx = context(&server, r#"<div id="talent-list"></div>"#, "/talent.html", None).await;

        Talent.init(&mut ctx).await.unwrap();

        let html = ctx.document.to_html();
        assert!(html.contains(r#"src="https://media.example.com/avatars/kid.jpg""#));
        assert!(html.contains(r#"href="/w/kid-lightning""#));
        assert!(html.contains(r#"href="/w/sub-2""#));
        assert!(html.contains(r#"<li class="tag">high flyer</li>"#));
        assert!(text(&ctx, LIST_ID).contains("Leeds, UK"));
    }

    #[tokio::test]
    async fn empty_directory_shows_empty_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profiles/wrestlers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let mut ctx = context(&server, r#"<div id="talent-list"></div>"#, "/talent.html", None).await;

        Talent.init(&mut ctx).await.unwrap();

        assert_eq!(text(&ctx, LIST_ID), "No wrestlers listed yet.");
    }
}
