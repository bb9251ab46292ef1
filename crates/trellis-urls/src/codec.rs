//! Route identifier codec.
//!
//! Logical identifiers (route paths, slice ids, server function ids) are
//! mapped to an "rsc path", and rsc paths are mapped to a file-system safe
//! wire segment. Every encoder has a strict inverse that fails with
//! [`CodecError::InvalidEncoding`] on malformed input.
//!
//! | Logical value | rsc path |
//! |---------------|----------|
//! | route `/` | `R/_root` |
//! | route `/a/b` | `R/a/b` |
//! | route `/_x` | `R/__x` |
//! | slice `sidebar` | `S/sidebar` |
//! | function `src/actions.rs#save` | `F/src/actions.rs/save` |

use crate::error::{CodecError, CodecResult};

/// Discriminator of encoded route paths.
pub const ROUTE_PREFIX: &str = "R";

/// Encoded form of the root route `/`.
pub const ROOT_SENTINEL: &str = "R/_root";

/// Discriminator of encoded slice ids.
pub const SLICE_PREFIX: &str = "S/";

/// Discriminator of encoded server function ids.
pub const FUNC_PREFIX: &str = "F/";

const RSC_SUFFIX: &str = ".txt";

/// Encodes a route path into an rsc path.
///
/// # Errors
///
/// Returns [`CodecError::InvalidInput`] if the path does not start with `/`
/// or ends with `/` (other than the root itself).
pub fn encode_route_path(path: &str) -> CodecResult<String> {
	if path == "/" {
		return Ok(ROOT_SENTINEL.to_string());
	}
	if !path.starts_with('/') {
		return Err(CodecError::InvalidInput(format!(
			"route path must start with `/`: {}",
			path
		)));
	}
	if path.ends_with('/') {
		return Err(CodecError::InvalidInput(format!(
			"route path must not end with `/`: {}",
			path
		)));
	}
	// `R/_...` is reserved for sentinels; a leading underscore is doubled.
	if path.starts_with("/_") {
		return Ok(format!("{}/_{}", ROUTE_PREFIX, &path[1..]));
	}
	Ok(format!("{}{}", ROUTE_PREFIX, path))
}

/// Decodes an rsc path produced by [`encode_route_path`].
pub fn decode_route_path(rsc_path: &str) -> CodecResult<String> {
	let rest = rsc_path
		.strip_prefix(ROUTE_PREFIX)
		.ok_or_else(|| CodecError::InvalidEncoding(format!("not a route path: {}", rsc_path)))?;
	if rsc_path == ROOT_SENTINEL {
		return Ok("/".to_string());
	}
	if !rest.starts_with('/') || rest.ends_with('/') {
		return Err(CodecError::InvalidEncoding(format!(
			"malformed route path: {}",
			rsc_path
		)));
	}
	if rest.starts_with("/__") {
		return Ok(format!("/{}", &rest[2..]));
	}
	if rest.starts_with("/_") {
		return Err(CodecError::InvalidEncoding(format!(
			"reserved route path: {}",
			rsc_path
		)));
	}
	Ok(rest.to_string())
}

/// Encodes an rsc path into a non-empty, file-system safe wire segment.
///
/// A leading `_` is added when the input is empty or starts with `_` or `/`;
/// a trailing `_` is added when a non-empty input ends with `_` or `/`.
pub fn encode_rsc_path(rsc_path: &str) -> String {
	let mut encoded = String::with_capacity(rsc_path.len() + RSC_SUFFIX.len() + 2);
	if rsc_path.is_empty() || rsc_path.starts_with('_') || rsc_path.starts_with('/') {
		encoded.push('_');
	}
	encoded.push_str(rsc_path);
	if !rsc_path.is_empty() && (rsc_path.ends_with('_') || rsc_path.ends_with('/')) {
		encoded.push('_');
	}
	encoded.push_str(RSC_SUFFIX);
	encoded
}

/// Decodes a wire segment produced by [`encode_rsc_path`].
pub fn decode_rsc_path(encoded: &str) -> CodecResult<String> {
	let body = encoded.strip_suffix(RSC_SUFFIX).ok_or_else(|| {
		CodecError::InvalidEncoding(format!("missing `{}` suffix: {}", RSC_SUFFIX, encoded))
	})?;
	let body = body.strip_prefix('_').unwrap_or(body);
	let body = body.strip_suffix('_').unwrap_or(body);
	// Only the canonical encoding of a value is accepted.
	if encode_rsc_path(body) != encoded {
		return Err(CodecError::InvalidEncoding(format!(
			"non-canonical rsc path: {}",
			encoded
		)));
	}
	Ok(body.to_string())
}

/// Encodes a `module#export` server function id.
///
/// # Errors
///
/// Returns [`CodecError::InvalidInput`] if the id has no `#`, an empty part,
/// or an export name containing `/`.
pub fn encode_func_id(func_id: &str) -> CodecResult<String> {
	let (module, export) = func_id.rsplit_once('#').ok_or_else(|| {
		CodecError::InvalidInput(format!("function id must be `module#export`: {}", func_id))
	})?;
	if module.is_empty() || export.is_empty() {
		return Err(CodecError::InvalidInput(format!(
			"function id has an empty part: {}",
			func_id
		)));
	}
	if export.contains('/') {
		return Err(CodecError::InvalidInput(format!(
			"function name must not contain `/`: {}",
			export
		)));
	}
	if module.starts_with('_') || module.starts_with('/') {
		return Ok(format!("{}_{}/{}", FUNC_PREFIX, module, export));
	}
	Ok(format!("{}{}/{}", FUNC_PREFIX, module, export))
}

/// Decodes an rsc path produced by [`encode_func_id`].
pub fn decode_func_id(rsc_path: &str) -> CodecResult<String> {
	let rest = rsc_path.strip_prefix(FUNC_PREFIX).ok_or_else(|| {
		CodecError::InvalidEncoding(format!("not a function id: {}", rsc_path))
	})?;
	let (module, export) = rest
		.rsplit_once('/')
		.filter(|(m, e)| !m.is_empty() && !e.is_empty())
		.ok_or_else(|| CodecError::InvalidEncoding(format!("malformed function id: {}", rsc_path)))?;
	let module = module.strip_prefix('_').unwrap_or(module);
	Ok(format!("{}#{}", module, export))
}

/// Encodes a slice id.
///
/// # Errors
///
/// Returns [`CodecError::InvalidInput`] for an empty id or one starting with `/`.
pub fn encode_slice_id(slice_id: &str) -> CodecResult<String> {
	if slice_id.is_empty() || slice_id.starts_with('/') {
		return Err(CodecError::InvalidInput(format!(
			"slice id must be non-empty and must not start with `/`: {}",
			slice_id
		)));
	}
	Ok(format!("{}{}", SLICE_PREFIX, slice_id))
}

/// Decodes a slice rsc path, returning `None` when it is not one.
///
/// Used by dispatchers to tell slice fetches from route fetches.
pub fn decode_slice_id_or_none(rsc_path: &str) -> Option<String> {
	rsc_path
		.strip_prefix(SLICE_PREFIX)
		.filter(|id| !id.is_empty())
		.map(str::to_string)
}

/// Decodes a slice rsc path.
pub fn decode_slice_id(rsc_path: &str) -> CodecResult<String> {
	decode_slice_id_or_none(rsc_path)
		.ok_or_else(|| CodecError::InvalidEncoding(format!("not a slice id: {}", rsc_path)))
}

/// What a wire path asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireTarget {
	/// A route fetch for the given logical path.
	Route(String),
	/// A slice fetch for the given slice id.
	Slice(String),
	/// A server function call for the given `module#export` id.
	Func(String),
	/// Any other component fetch, carrying the raw rsc path.
	Other(String),
}

/// Builds `<base_path><rsc_base>/<encoded rsc path>`.
pub fn wire_path(base_path: &str, rsc_base: &str, rsc_path: &str) -> String {
	format!("{}{}/{}", base_path, rsc_base, encode_rsc_path(rsc_path))
}

/// Builds the wire path of a route fetch.
pub fn route_wire_path(base_path: &str, rsc_base: &str, route_path: &str) -> CodecResult<String> {
	Ok(wire_path(base_path, rsc_base, &encode_route_path(route_path)?))
}

/// Builds the wire path of a slice fetch.
pub fn slice_wire_path(base_path: &str, rsc_base: &str, slice_id: &str) -> CodecResult<String> {
	Ok(wire_path(base_path, rsc_base, &encode_slice_id(slice_id)?))
}

/// Parses a wire path and classifies its target.
pub fn parse_wire_path(base_path: &str, rsc_base: &str, wire: &str) -> CodecResult<WireTarget> {
	let prefix = format!("{}{}/", base_path, rsc_base);
	let encoded = wire
		.strip_prefix(&prefix)
		.ok_or_else(|| CodecError::InvalidEncoding(format!("not under `{}`: {}", prefix, wire)))?;
	let rsc_path = decode_rsc_path(encoded)?;
	if let Some(slice_id) = decode_slice_id_or_none(&rsc_path) {
		return Ok(WireTarget::Slice(slice_id));
	}
	if rsc_path.starts_with(FUNC_PREFIX) {
		return decode_func_id(&rsc_path).map(WireTarget::Func);
	}
	if rsc_path.starts_with(ROUTE_PREFIX) {
		return decode_route_path(&rsc_path).map(WireTarget::Route);
	}
	Ok(WireTarget::Other(rsc_path))
}
