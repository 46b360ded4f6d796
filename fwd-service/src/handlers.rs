use std::collections::HashMap;

use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use fwd_core::{
    apply_configuration, check_permission, check_target, compute_redirect,
    dynamic_redirect_location, encode_sub_path, referred_item_exists, rename_entry,
    suggest_with_limits, ConfigOutcome, ConfigSubmission, Entity, EntityKind, EntityMode,
    ForwardError, ForwardingEntry, NamespaceResolver, NamespaceStore, Permission,
    RedirectDecision,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::router::{self, ItemRoute};
use crate::server::AppState;
use crate::{views, Result, ServiceError};

#[derive(Debug, Deserialize)]
pub struct RenameForm {
    #[serde(rename = "newName")]
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub mode: EntityMode,
}

fn redirect(status: StatusCode, location: &str) -> Result<Response> {
    let value = HeaderValue::try_from(location).map_err(|e| {
        ServiceError::ServerError(format!("Invalid redirect location {}: {}", location, e))
    })?;
    Ok((status, [(header::LOCATION, value)]).into_response())
}

/// Save the namespace to the state file, if there is one.
///
/// The change is already live in memory, so a failed save is logged and the
/// request still succeeds; the file catches up on the next successful save.
fn persist(state: &AppState) {
    if let Some(path) = &state.options.state_file {
        if let Err(e) = state.namespace.save(path) {
            error!("Failed to save namespace to {}: {}", path.display(), e);
        }
    }
}

fn local_route(state: &AppState, path: &str) -> Result<ItemRoute> {
    let ns = state.namespace.as_ref();
    let local = router::strip_url_prefix(ns.url_prefix(), path)
        .ok_or_else(|| ForwardError::NotFound(path.to_string()))?;
    Ok(router::route(ns, local))
}

/// Handle GET requests for any path in the namespace.
pub async fn get_item(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    get_path(&state, uri.path(), &query).into_response()
}

fn get_path(state: &AppState, path: &str, query: &HashMap<String, String>) -> Result<Response> {
    check_permission(&state.options.grants, Permission::Read)?;
    let ns = state.namespace.as_ref();
    let item = local_route(state, path)?;
    debug!("GET {} resolved to '{}' with rest '{}'", path, item.entity.full_name, item.rest);

    match &item.entity.kind {
        EntityKind::Forwarding(entry) => get_forwarding(state, &item, entry, query),
        EntityKind::Group if item.is_index() => {
            let children = ns.children(&item.entity);
            Ok(Json(views::group_json(&item.entity, &children)).into_response())
        }
        EntityKind::Plain if item.is_index() => {
            Ok(Json(views::entity_json(&item.entity, None)).into_response())
        }
        _ => Err(ForwardError::NotFound(path.to_string()).into()),
    }
}

fn get_forwarding(
    state: &AppState,
    item: &ItemRoute,
    entry: &ForwardingEntry,
    query: &HashMap<String, String>,
) -> Result<Response> {
    let ns = state.namespace.as_ref();
    if item.is_index() {
        return dispatch(state, &item.entity, entry, query.get("path").map(String::as_str));
    }

    let value = query.get("value").map(String::as_str).unwrap_or_default();
    match item.action() {
        Some("autoCompleteReferredItemName") => {
            let suggestions: Vec<String> =
                suggest_with_limits(value, ns, state.options.suggest_limits).collect();
            Ok(Json(json!({ "suggestions": suggestions })).into_response())
        }
        Some("checkReferredItemName") => {
            Ok(Json(check_target(value, &item.entity, ns)).into_response())
        }
        Some("rename") => {
            let new_name = query
                .get("newName")
                .ok_or_else(|| ForwardError::InvalidName("newName is required".to_string()))?;
            Ok(Html(views::rename_confirmation(entry, new_name)).into_response())
        }
        _ => {
            // Anything else below the entry is a sub-path for the target.
            let location = dynamic_redirect_location(&item.entity.url, &item.rest);
            redirect(StatusCode::FOUND, &location)
        }
    }
}

fn dispatch(
    state: &AppState,
    entity: &Entity,
    entry: &ForwardingEntry,
    path: Option<&str>,
) -> Result<Response> {
    let ns = state.namespace.as_ref();
    let sub_path = path.map(encode_sub_path);
    match compute_redirect(entity, sub_path.as_deref(), ns) {
        RedirectDecision::PermanentRedirect { url } => {
            debug!("Forwarding {} to {}", entity.full_name, url);
            redirect(StatusCode::MOVED_PERMANENTLY, &url)
        }
        RedirectDecision::DeferredView { target_url } => {
            let html = views::interstitial(entry, &target_url, state.options.interstitial_delay_secs);
            Ok(Html(html).into_response())
        }
        RedirectDecision::NotConfigured => {
            let html = views::not_configured(entry, referred_item_exists(entry, ns));
            Ok(Html(html).into_response())
        }
    }
}

/// Handle POST actions: configuration, rename, create and delete.
pub async fn post_item(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let item = match local_route(&state, &path) {
        Ok(item) => item,
        Err(e) => return e.into_response(),
    };
    let action = item.action().map(str::to_string);
    debug!("POST {} resolved to '{}' action {:?}", path, item.entity.full_name, action);

    match (action.as_deref(), &item.entity.kind) {
        (Some("configSubmit"), EntityKind::Forwarding(_)) => {
            let submission = match Json::<ConfigSubmission>::from_request(request, &state).await {
                Ok(Json(submission)) => submission,
                Err(rejection) => return rejection.into_response(),
            };
            config_submit(&state, &item.entity, submission).into_response()
        }
        (Some("doRename"), EntityKind::Forwarding(_)) => {
            let form = match Form::<RenameForm>::from_request(request, &state).await {
                Ok(Form(form)) => form,
                Err(rejection) => return rejection.into_response(),
            };
            do_rename(&state, &item.entity, &form.new_name).into_response()
        }
        (Some("createItem"), EntityKind::Group) => {
            let create = match Json::<CreateItemRequest>::from_request(request, &state).await {
                Ok(Json(create)) => create,
                Err(rejection) => return rejection.into_response(),
            };
            create_item(&state, &item.entity, create).into_response()
        }
        (Some("doDelete"), _) if !item.entity.full_name.is_empty() => {
            do_delete(&state, &item.entity).into_response()
        }
        _ => ServiceError::from(ForwardError::NotFound(path)).into_response(),
    }
}

fn config_submit(state: &AppState, entity: &Entity, submission: ConfigSubmission) -> Result<Response> {
    let ns = state.namespace.as_ref();
    let outcome = apply_configuration(ns, &state.options.grants, &entity.full_name, submission)?;
    persist(state);

    match outcome {
        ConfigOutcome::Saved(saved) => redirect(StatusCode::SEE_OTHER, &saved.url),
        ConfigOutcome::RenameRequested { entity, new_name } => {
            let location = format!("{}rename?newName={}", entity.url, urlencoding::encode(&new_name));
            redirect(StatusCode::SEE_OTHER, &location)
        }
    }
}

fn do_rename(state: &AppState, entity: &Entity, new_name: &str) -> Result<Response> {
    let renamed = rename_entry(state.namespace.as_ref(), &state.options.grants, &entity.full_name, new_name)?;
    persist(state);
    redirect(StatusCode::SEE_OTHER, &renamed.url)
}

fn create_item(state: &AppState, group: &Entity, create: CreateItemRequest) -> Result<Response> {
    check_permission(&state.options.grants, Permission::Create)?;
    let created = state.namespace.create(&group.full_name, &create.name, create.mode)?;
    persist(state);
    Ok((StatusCode::CREATED, Json(views::entity_json(&created, None))).into_response())
}

fn do_delete(state: &AppState, entity: &Entity) -> Result<Response> {
    check_permission(&state.options.grants, Permission::Delete)?;
    state.namespace.delete(&entity.full_name)?;
    persist(state);
    Ok(StatusCode::NO_CONTENT.into_response())
}
