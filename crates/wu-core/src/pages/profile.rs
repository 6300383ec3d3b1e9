//! Public wrestler profile and the "my profile" editors.

use wu_client::{ApiClient, ApiError, PromoterProfile, WrestlerProfile};

use super::talent::wrestler_card;
use super::{empty_state, render_error, render_into};
use crate::boot::{BootContext, Module};
use crate::dom::{Document, NodeId, escape_html};
use crate::error::BootError;

const PUBLIC_ID: &str = "wrestler-profile";
const WRESTLER_FORM_ID: &str = "wrestler-form";
const PROMOTER_FORM_ID: &str = "promoter-form";
const STATUS_ID: &str = "form-status";
const PHOTO_ID: &str = "profile-photo";

/// A wrestler's public page, by `/w/<handle>` or `?handle=`.
#[derive(Debug, Clone, Copy)]
pub struct PublicWrestlerProfile;

#[async_trait::async_trait]
impl Module for PublicWrestlerProfile {
    fn name(&self) -> &'static str {
        "wrestler-profile"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        if ctx.document.get_element_by_id(PUBLIC_ID).is_none() {
            return Ok(());
        }
        let Some(handle) = ctx.page.as_ref().and_then(|p| p.param.clone()) else {
            render_into(&mut ctx.document, PUBLIC_ID, &empty_state("No wrestler selected."));
            return Ok(());
        };
        let api = ctx.api()?;
        match api.get_wrestler(&handle).await {
            Ok(w) => {
                let html = format!(
                    r#"{}<section class="bio"><p>{}</p></section>"#,
                    wrestler_card(&w, &api),
                    escape_html(&w.bio)
                );
                render_into(&mut ctx.document, PUBLIC_ID, &html);
            }
            Err(e) if e.is_not_found() => {
                render_into(&mut ctx.document, PUBLIC_ID, &empty_state("Wrestler not found."));
            }
            Err(e) => render_error(&mut ctx.document, PUBLIC_ID, "this profile", &e),
        }
        Ok(())
    }
}

/// Loads the signed-in wrestler's profile into `#wrestler-form`.
#[derive(Debug, Clone, Copy)]
pub struct MyWrestlerProfile;

#[async_trait::async_trait]
impl Module for MyWrestlerProfile {
    fn name(&self) -> &'static str {
        "my-wrestler-profile"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let Some(form) = ctx.document.get_element_by_id(WRESTLER_FORM_ID) else {
            return Ok(());
        };
        let api = ctx.api()?;
        match api.my_wrestler_profile().await {
            Ok(Some(p)) => {
                let doc = &mut ctx.document;
                set_field(doc, form, "handle", p.handle.as_deref().unwrap_or_default());
                set_field(doc, form, "stageName", &p.stage_name);
                set_field(doc, form, "city", &p.city);
                set_field(doc, form, "region", &p.region);
                set_field(doc, form, "country", &p.country);
                set_field(doc, form, "bio", &p.bio);
                set_field(doc, form, "gimmicks", &p.gimmicks.join(", "));
                set_field(doc, form, "photoKey", p.photo_key.as_deref().unwrap_or_default());
                show_photo(doc, &api, p.photo_key.as_deref());
            }
            Ok(None) => set_status(&mut ctx.document, "Create your profile to get discovered."),
            Err(e) => render_error(&mut ctx.document, STATUS_ID, "your profile", &e),
        }
        Ok(())
    }
}

/// Loads the signed-in promoter's profile into `#promoter-form`.
#[derive(Debug, Clone, Copy)]
pub struct MyPromoterProfile;

#[async_trait::async_trait]
impl Module for MyPromoterProfile {
    fn name(&self) -> &'static str {
        "my-promoter-profile"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let Some(form) = ctx.document.get_element_by_id(PROMOTER_FORM_ID) else {
            return Ok(());
        };
        let api = ctx.api()?;
        match api.my_promoter_profile().await {
            Ok(Some(p)) => {
                let doc = &mut ctx.document;
                set_field(doc, form, "name", &p.name);
                set_field(doc, form, "city", &p.city);
                set_field(doc, form, "region", &p.region);
                set_field(doc, form, "country", &p.country);
                set_field(doc, form, "bio", &p.bio);
                set_field(doc, form, "photoKey", p.photo_key.as_deref().unwrap_or_default());
                show_photo(doc, &api, p.photo_key.as_deref());
            }
            Ok(None) => set_status(&mut ctx.document, "Set up your promotion's profile."),
            Err(e) => render_error(&mut ctx.document, STATUS_ID, "your profile", &e),
        }
        Ok(())
    }
}

/// Read `#wrestler-form`, `PUT` it, and report the outcome in
/// `#form-status`.
///
/// # Errors
///
/// Returns the [`ApiError`] from the save; it is also shown inline.
pub async fn save_wrestler_form(
    doc: &mut Document,
    api: &ApiClient,
) -> Result<WrestlerProfile, ApiError> {
    let Some(form) = doc.get_element_by_id(WRESTLER_FORM_ID) else {
        return Err(ApiError::Config("page has no wrestler profile form".to_owned()));
    };
    let optional = |v: String| Some(v).filter(|s| !s.is_empty());
    let profile = WrestlerProfile {
        handle: optional(field_value(doc, form, "handle")),
        subject_id: None,
        stage_name: field_value(doc, form, "stageName"),
        city: field_value(doc, form, "city"),
        region: field_value(doc, form, "region"),
        country: field_value(doc, form, "country"),
        bio: field_value(doc, form, "bio"),
        gimmicks: field_value(doc, form, "gimmicks")
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_owned)
            .collect(),
        photo_key: optional(field_value(doc, form, "photoKey")),
    };
    report_save(doc, api.save_wrestler_profile(&profile).await).map(|()| profile)
}

/// Read `#promoter-form`, `PUT` it, and report the outcome in
/// `#form-status`.
///
/// # Errors
///
/// Returns the [`ApiError`] from the save; it is also shown inline.
pub async fn save_promoter_form(
    doc: &mut Document,
    api: &ApiClient,
) -> Result<PromoterProfile, ApiError> {
    let Some(form) = doc.get_element_by_id(PROMOTER_FORM_ID) else {
        return Err(ApiError::Config("page has no promoter profile form".to_owned()));
    };
    let profile = PromoterProfile {
        subject_id: None,
        name: field_value(doc, form, "name"),
        city: field_value(doc, form, "city"),
        region: field_value(doc, form, "region"),
        country: field_value(doc, form, "country"),
        bio: field_value(doc, form, "bio"),
        photo_key: Some(field_value(doc, form, "photoKey")).filter(|s| !s.is_empty()),
    };
    report_save(doc, api.save_promoter_profile(&profile).await).map(|()| profile)
}

fn report_save(doc: &mut Document, result: Result<(), ApiError>) -> Result<(), ApiError> {
    match &result {
        Ok(()) => set_status(doc, "Profile saved."),
        Err(e) => set_status(doc, &format!("Could not save profile. {e}")),
    }
    result
}

fn set_status(doc: &mut Document, message: &str) {
    if let Some(status) = doc.get_element_by_id(STATUS_ID) {
        doc.set_text(status, message);
    }
}

fn show_photo(doc: &mut Document, api: &ApiClient, key: Option<&str>) {
    let (Some(img), Some(url)) = (
        doc.get_element_by_id(PHOTO_ID),
        key.and_then(|k| api.media_url(k)),
    ) else {
        return;
    };
    doc.set_attr(img, "src", &url);
    doc.set_hidden(img, false);
}

/// The form control named `name` inside `form`.
fn field(doc: &Document, form: NodeId, name: &str) -> Option<NodeId> {
    doc.descendants(form).into_iter().find(|&id| {
        matches!(doc.tag(id), Some("input" | "textarea" | "select")) && doc.attr(id, "name") == Some(name)
    })
}

fn set_field(doc: &mut Document, form: NodeId, name: &str, value: &str) {
    let Some(control) = field(doc, form, name) else {
        return;
    };
    if doc.tag(control) == Some("textarea") {
        doc.set_text(control, value);
    } else {
        doc.set_attr(control, "value", value);
    }
}

fn field_value(doc: &Document, form: NodeId, name: &str) -> String {
    let Some(control) = field(doc, form, name) else {
        return String::new();
    };
    let raw = if doc.tag(control) == Some("textarea") {
        doc.text_content(control)
    } else {
        doc.attr(control, "value").unwrap_or_default().to_owned()
    };
    raw.trim().to_owned()
}
