//! Reconciles the read API's response shape with the ingestion shape.
//!
//! Notices are reported with CGI data under `request.cgi_data`, but the read
//! API returns it at the top level as `web_environment`. Copying it back lets
//! one schema describe both directions.

use serde_json::{Map, Value};

use crate::LoaderError;

pub const WEB_ENVIRONMENT: &str = "web_environment";
pub const REQUEST: &str = "request";
pub const CGI_DATA: &str = "cgi_data";

/// Copy `web_environment` into `request.cgi_data`.
///
/// The edit is additive: `web_environment` stays in place and any existing
/// `request.cgi_data` is overwritten.
pub fn normalize(mut doc: Map<String, Value>) -> Result<Map<String, Value>, LoaderError> {
    let cgi_data = match doc.get(WEB_ENVIRONMENT) {
        Some(Value::Object(env)) => env.clone(),
        Some(_) => return Err(not_an_object(WEB_ENVIRONMENT)),
        None => return Err(missing(WEB_ENVIRONMENT)),
    };

    match doc.get_mut(REQUEST) {
        Some(Value::Object(request)) => {
            request.insert(CGI_DATA.to_string(), Value::Object(cgi_data));
        }
        Some(_) => return Err(not_an_object(REQUEST)),
        None => return Err(missing(REQUEST)),
    }

    Ok(doc)
}

fn missing(field: &str) -> LoaderError {
    LoaderError::Schema(format!("notice is missing `{field}`"))
}

fn not_an_object(field: &str) -> LoaderError {
    LoaderError::Schema(format!("notice field `{field}` is not an object"))
}
