//! `$ref` pointer decoding and lookups of parameter, request body and
//! response components.

use percent_encoding::percent_decode_str;

use super::components::Components;
use super::parameter::{Parameter, ParameterOrRef};
use super::request_body::{RequestBody, RequestBodyOrRef};
use super::response::{Response, ResponseOrRef};
use crate::error::ResolveError;

/// Upper bound on `$ref` → `$ref` hops between components.
const MAX_REF_HOPS: usize = 16;

/// Decodes a JSON Pointer segment (`~1` → `/`, `~0` → `~`, then percent-decoding).
pub fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded).decode_utf8_lossy().into_owned()
}

/// Extract the decoded component name from `#/components/{section}/{name}`.
pub fn component_name(ref_path: &str, section: &str) -> Result<String, ResolveError> {
    let invalid = || ResolveError::InvalidRefFormat(ref_path.to_string());
    let pointer = ref_path.strip_prefix("#/").ok_or_else(invalid)?;
    let mut segments = pointer.splitn(3, '/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some("components"), Some(s), Some(name)) if s == section && !name.is_empty() => {
            Ok(decode_pointer_segment(name))
        }
        _ => Err(invalid()),
    }
}

impl Components {
    /// Follow a parameter `$ref` through `components.parameters`.
    /// A missing target is logged and yields `None`.
    pub fn resolve_parameter<'a>(&'a self, param: &'a ParameterOrRef) -> Option<&'a Parameter> {
        let mut current = param;
        for _ in 0..MAX_REF_HOPS {
            match current {
                ParameterOrRef::Parameter(p) => return Some(p),
                ParameterOrRef::Ref { ref_path } => {
                    current = lookup(&self.parameters, ref_path, "parameters")?;
                }
            }
        }
        log::warn!("parameter reference chain too long; skipping parameter");
        None
    }

    /// Follow a request body `$ref` through `components.requestBodies`.
    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a RequestBodyOrRef,
    ) -> Option<&'a RequestBody> {
        let mut current = body;
        for _ in 0..MAX_REF_HOPS {
            match current {
                RequestBodyOrRef::RequestBody(b) => return Some(b),
                RequestBodyOrRef::Ref { ref_path } => {
                    current = lookup(&self.request_bodies, ref_path, "requestBodies")?;
                }
            }
        }
        log::warn!("request body reference chain too long; treating body as absent");
        None
    }

    /// Follow a response `$ref` through `components.responses`.
    pub fn resolve_response<'a>(&'a self, response: &'a ResponseOrRef) -> Option<&'a Response> {
        let mut current = response;
        for _ in 0..MAX_REF_HOPS {
            match current {
                ResponseOrRef::Response(r) => return Some(r),
                ResponseOrRef::Ref { ref_path } => {
                    current = lookup(&self.responses, ref_path, "responses")?;
                }
            }
        }
        log::warn!("response reference chain too long; treating response as absent");
        None
    }
}

fn lookup<'a, T>(
    map: &'a indexmap::IndexMap<String, T>,
    ref_path: &str,
    section: &str,
) -> Option<&'a T> {
    let name = match component_name(ref_path, section) {
        Ok(name) => name,
        Err(e) => {
            log::warn!("{e}");
            return None;
        }
    };
    let found = map.get(&name);
    if found.is_none() {
        log::warn!("unresolved reference {ref_path}");
    }
    found
}
