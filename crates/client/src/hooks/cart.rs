//! Saved cart template hooks.

use wholesale_core::{CartTemplate, CartTemplateDetails, CartTemplateId};

use super::Query;
use crate::api::CartApi;

#[must_use]
pub fn saved_templates(api: &CartApi) -> Query<(), Vec<CartTemplate>> {
    let api = api.clone();
    Query::new(move |()| {
        let api = api.clone();
        async move { api.templates().await }
    })
}

/// One template with its lines; refetches when the id changes.
#[must_use]
pub fn template_details(api: &CartApi) -> Query<CartTemplateId, CartTemplateDetails> {
    let api = api.clone();
    Query::new(move |id: CartTemplateId| {
        let api = api.clone();
        async move { api.template_details(id).await }
    })
}
