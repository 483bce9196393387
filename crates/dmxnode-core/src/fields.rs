//! Field bindings between configuration keys and editable form fields.
//!
//! Configuration keys travel as camelCase (`dhcpEnabled`); the form fields
//! they bind to are addressed by kebab-case ids (`dhcp-enabled`). The table
//! is built once from [`FIELD_SPECS`] and looked up by key. A lookup miss is
//! never an error on the inbound path.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

use dmxnode_api::Endpoint;

use crate::error::CoreError;

// ── Key transform ────────────────────────────────────────────────────

/// Convert a camelCase key to its kebab-case field id.
///
/// A `-` goes before every uppercase letter that follows a lowercase letter
/// or digit, and before an uppercase letter that follows another uppercase
/// letter and precedes a lowercase one (`HTTPServer` → `http-server`).
/// Strings without uppercase letters pass through unchanged, as do
/// uppercase letters that have no lowercase form (`𝐀`), so applying the
/// transform twice gives the same result as applying it once.
pub fn camel_to_kebab(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if has_lowercase_form(c) && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let word_start = prev.is_lowercase() || prev.is_ascii_digit();
            let acronym_end = prev.is_uppercase() && next.is_some_and(char::is_lowercase);
            if word_start || acronym_end {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

fn has_lowercase_form(c: char) -> bool {
    c.is_uppercase() && !c.to_lowercase().eq(std::iter::once(c))
}

// ── Field declarations ───────────────────────────────────────────────

/// How a field stores and coerces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    /// Checkbox: checked / unchecked.
    Toggle,
    /// Integer input.
    Number,
    /// Free text.
    Text,
}

/// The configuration forms the device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FormTarget {
    Network,
    Artnet,
    Pixel,
    Ap,
}

impl FormTarget {
    pub fn endpoint(self) -> Endpoint {
        match self {
            Self::Network => Endpoint::Network,
            Self::Artnet => Endpoint::Artnet,
            Self::Pixel => Endpoint::Pixel,
            Self::Ap => Endpoint::Ap,
        }
    }

    /// Label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "网络",
            Self::Artnet => "Art-Net",
            Self::Pixel => "像素",
            Self::Ap => "AP模式",
        }
    }
}

/// Static declaration of one bound field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Canonical camelCase key as it appears in config snapshots.
    pub key: &'static str,
    pub kind: FieldKind,
    /// Form the field belongs to; `None` for live controls.
    pub form: Option<FormTarget>,
    /// Name used in the submitted body when it differs from `key`.
    pub submit_name: Option<&'static str>,
}

const fn spec(key: &'static str, kind: FieldKind, form: Option<FormTarget>) -> FieldSpec {
    FieldSpec {
        key,
        kind,
        form,
        submit_name: None,
    }
}

/// Every field the console knows about, in form order.
pub const FIELD_SPECS: &[FieldSpec] = &[
    // network
    spec("deviceName", FieldKind::Text, Some(FormTarget::Network)),
    spec("dhcpEnabled", FieldKind::Toggle, Some(FormTarget::Network)),
    spec("staticIP", FieldKind::Text, Some(FormTarget::Network)),
    spec("staticMask", FieldKind::Text, Some(FormTarget::Network)),
    spec("staticGateway", FieldKind::Text, Some(FormTarget::Network)),
    // artnet
    spec("artnetNet", FieldKind::Number, Some(FormTarget::Artnet)),
    spec("artnetSubnet", FieldKind::Number, Some(FormTarget::Artnet)),
    spec("artnetUniverse", FieldKind::Number, Some(FormTarget::Artnet)),
    spec("dmxStartAddress", FieldKind::Number, Some(FormTarget::Artnet)),
    // pixel
    spec("pixelCount", FieldKind::Number, Some(FormTarget::Pixel)),
    spec("pixelType", FieldKind::Number, Some(FormTarget::Pixel)),
    spec("pixelEnabled", FieldKind::Toggle, Some(FormTarget::Pixel)),
    // ap
    FieldSpec {
        key: "apEnabled",
        kind: FieldKind::Toggle,
        form: Some(FormTarget::Ap),
        submit_name: Some("enabled"),
    },
    spec("apSsid", FieldKind::Text, Some(FormTarget::Ap)),
    spec("apPassword", FieldKind::Text, Some(FormTarget::Ap)),
    spec("apChannel", FieldKind::Number, Some(FormTarget::Ap)),
    // live controls
    spec("pixelTest", FieldKind::Number, None),
];

pub const DHCP_KEY: &str = "dhcpEnabled";
pub const AP_ENABLED_KEY: &str = "apEnabled";

// ── Values ───────────────────────────────────────────────────────────

/// Current content of a bound field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Toggle(bool),
    /// `None` when the field holds something that is not an integer.
    Number(Option<i64>),
    Text(String),
}

impl FieldValue {
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Toggle => Self::Toggle(false),
            FieldKind::Number => Self::Number(None),
            FieldKind::Text => Self::Text(String::new()),
        }
    }

    /// Coerce a config snapshot value for a field of `kind`.
    pub fn from_remote(kind: FieldKind, value: &Value) -> Self {
        match kind {
            FieldKind::Toggle => Self::Toggle(is_truthy(value)),
            FieldKind::Number => Self::Number(int_from_value(value)),
            FieldKind::Text => Self::Text(raw_text(value)),
        }
    }

    /// Coerce user input for a field of `kind`.
    pub fn from_input(kind: FieldKind, raw: &str) -> Result<Self, CoreError> {
        match kind {
            FieldKind::Toggle => parse_toggle(raw).map(Self::Toggle).ok_or_else(|| {
                CoreError::ValidationFailed {
                    message: format!("expected on/off or true/false, got '{raw}'"),
                }
            }),
            FieldKind::Number => parse_int_prefix(raw)
                .map(|n| Self::Number(Some(n)))
                .ok_or_else(|| CoreError::ValidationFailed {
                    message: format!("expected an integer, got '{raw}'"),
                }),
            FieldKind::Text => Ok(Self::Text(raw.to_owned())),
        }
    }

    /// Outbound representation for a form body.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Toggle(checked) => Value::Bool(*checked),
            Self::Number(Some(n)) => Value::from(*n),
            Self::Number(None) => Value::Null,
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_toggle(&self) -> Option<bool> {
        match self {
            Self::Toggle(checked) => Some(*checked),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle(true) => f.write_str("on"),
            Self::Toggle(false) => f.write_str("off"),
            Self::Number(Some(n)) => write!(f, "{n}"),
            Self::Number(None) => f.write_str("-"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < 9.0e18)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse the leading integer of `s`: optional whitespace, optional sign,
/// then digits. Trailing garbage is ignored ("42px" → 42).
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['+', '-']));
    let digits_len = trimmed[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    trimmed[..digits_start + digits_len].parse().ok()
}

fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

// ── FieldBinding ─────────────────────────────────────────────────────

/// One field and its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub key: &'static str,
    pub element_id: String,
    pub kind: FieldKind,
    pub form: Option<FormTarget>,
    pub submit_name: &'static str,
    pub value: FieldValue,
}

impl FieldBinding {
    fn from_spec(spec: &FieldSpec) -> Self {
        Self {
            key: spec.key,
            element_id: camel_to_kebab(spec.key),
            kind: spec.kind,
            form: spec.form,
            submit_name: spec.submit_name.unwrap_or(spec.key),
            value: FieldValue::empty(spec.kind),
        }
    }
}

// ── FieldSyncAdapter ─────────────────────────────────────────────────

/// Owns the binding table and moves values between wire payloads and fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSyncAdapter {
    bindings: IndexMap<String, FieldBinding>,
}

impl Default for FieldSyncAdapter {
    fn default() -> Self {
        Self::from_specs(FIELD_SPECS)
    }
}

impl FieldSyncAdapter {
    pub fn from_specs(specs: &[FieldSpec]) -> Self {
        let bindings = specs
            .iter()
            .map(FieldBinding::from_spec)
            .map(|binding| (binding.element_id.clone(), binding))
            .collect();
        Self { bindings }
    }

    /// Look up a field by canonical key or element id.
    pub fn get(&self, key: &str) -> Option<&FieldBinding> {
        self.bindings.get(&camel_to_kebab(key))
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut FieldBinding> {
        self.bindings.get_mut(&camel_to_kebab(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldBinding> {
        self.bindings.values()
    }

    /// Fields belonging to `target`, in declaration order.
    pub fn form_fields(&self, target: FormTarget) -> impl Iterator<Item = &FieldBinding> {
        self.iter().filter(move |b| b.form == Some(target))
    }

    pub fn toggle(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|b| b.value.as_toggle())
    }

    /// Write one snapshot value into its bound field. Returns `false` when
    /// no field is bound to `key`.
    pub fn apply_remote(&mut self, key: &str, value: &Value) -> bool {
        let Some(binding) = self.get_mut(key) else {
            tracing::trace!(key, "no field bound to config key");
            return false;
        };
        binding.value = FieldValue::from_remote(binding.kind, value);
        true
    }

    /// Apply every key of a snapshot; misses are skipped. Returns the
    /// number of fields written.
    pub fn apply_config<'a>(
        &mut self,
        entries: impl IntoIterator<Item = (&'a String, &'a Value)>,
    ) -> usize {
        entries
            .into_iter()
            .filter(|(key, value)| self.apply_remote(key, value))
            .count()
    }

    /// Apply user input to a field.
    pub fn edit(&mut self, key: &str, raw: &str) -> Result<&FieldBinding, CoreError> {
        let binding = self.get_mut(key).ok_or_else(|| CoreError::UnknownField {
            key: key.to_owned(),
        })?;
        binding.value = FieldValue::from_input(binding.kind, raw)?;
        Ok(binding)
    }

    /// Assemble the outbound body for `target`.
    pub fn collect_form(&self, target: FormTarget) -> Map<String, Value> {
        self.form_fields(target)
            .map(|b| (b.submit_name.to_owned(), b.value.to_json()))
            .collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn kebab_examples() {
        assert_eq!(camel_to_kebab("dhcpEnabled"), "dhcp-enabled");
        assert_eq!(camel_to_kebab("apIp"), "ap-ip");
        assert_eq!(camel_to_kebab("staticIP"), "static-ip");
        assert_eq!(camel_to_kebab("HTTPServer"), "http-server");
        assert_eq!(camel_to_kebab("dmx512Start"), "dmx512-start");
        assert_eq!(camel_to_kebab("Uptime"), "uptime");
    }

    #[test]
    fn kebab_is_identity_on_kebab() {
        for s in ["dhcp-enabled", "ap-ip", "", "uptime", "x-1-y"] {
            assert_eq!(camel_to_kebab(s), s);
        }
    }

    #[test]
    fn kebab_is_idempotent() {
        for s in [
            "dhcpEnabled",
            "staticIP",
            "HTTPServer",
            "aB",
            "ABC",
            "already-kebab",
            "mixed-Case",
            "ÄpfelBaum",
            "A\u{1D400}",
            "x\u{1D400}Y",
            "\u{1D400}Ab",
        ] {
            let once = camel_to_kebab(s);
            assert_eq!(camel_to_kebab(&once), once, "input {s}");
        }
    }

    #[test]
    fn uppercase_without_lowercase_form_is_kept() {
        assert_eq!(camel_to_kebab("A\u{1D400}"), "a\u{1D400}");
        assert_eq!(camel_to_kebab("\u{1D400}Ab"), "\u{1D400}-ab");
    }

    #[test]
    fn lookup_accepts_key_or_id() {
        let adapter = FieldSyncAdapter::default();
        assert_eq!(adapter.get("dhcpEnabled").unwrap().element_id, "dhcp-enabled");
        assert_eq!(adapter.get("dhcp-enabled").unwrap().key, "dhcpEnabled");
        assert!(adapter.get("nonexistent").is_none());
    }

    #[test]
    fn remote_coercion_by_kind() {
        let mut adapter = FieldSyncAdapter::default();
        adapter.apply_remote("dhcpEnabled", &json!(1));
        adapter.apply_remote("artnetUniverse", &json!("12"));
        adapter.apply_remote("pixelCount", &json!(170.9));
        adapter.apply_remote("deviceName", &json!("truss-left"));
        adapter.apply_remote("staticIP", &json!(null));

        assert_eq!(adapter.toggle("dhcpEnabled"), Some(true));
        assert_eq!(
            adapter.get("artnetUniverse").unwrap().value,
            FieldValue::Number(Some(12))
        );
        assert_eq!(
            adapter.get("pixelCount").unwrap().value,
            FieldValue::Number(Some(170))
        );
        assert_eq!(
            adapter.get("deviceName").unwrap().value,
            FieldValue::Text("truss-left".into())
        );
        assert_eq!(
            adapter.get("staticIP").unwrap().value,
            FieldValue::Text(String::new())
        );
    }

    #[test]
    fn non_numeric_remote_value_clears_number() {
        let mut adapter = FieldSyncAdapter::default();
        adapter.apply_remote("pixelType", &json!(2));
        adapter.apply_remote("pixelType", &json!("ws2812"));
        assert_eq!(adapter.get("pixelType").unwrap().value, FieldValue::Number(None));
    }

    #[test]
    fn apply_config_skips_unbound_keys() {
        let mut adapter = FieldSyncAdapter::default();
        let payload = json!({
            "deviceName": "node",
            "firmwareBuild": "2024.3",
            "artnetNet": 1
        });
        let written = adapter.apply_config(payload.as_object().unwrap());
        assert_eq!(written, 2);
        assert_eq!(adapter.get("artnetNet").unwrap().value, FieldValue::Number(Some(1)));
    }

    #[test]
    fn edit_validates_input() {
        let mut adapter = FieldSyncAdapter::default();
        assert_eq!(
            adapter.edit("pixelEnabled", "on").unwrap().value,
            FieldValue::Toggle(true)
        );
        assert_eq!(
            adapter.edit("dmxStartAddress", " 101").unwrap().value,
            FieldValue::Number(Some(101))
        );
        assert!(matches!(
            adapter.edit("dmxStartAddress", "first"),
            Err(CoreError::ValidationFailed { .. })
        ));
        assert!(matches!(
            adapter.edit("pixelEnabled", "maybe"),
            Err(CoreError::ValidationFailed { .. })
        ));
        assert!(matches!(
            adapter.edit("colorOrder", "grb"),
            Err(CoreError::UnknownField { .. })
        ));
    }

    #[test]
    fn collect_form_uses_submit_names_and_types() {
        let mut adapter = FieldSyncAdapter::default();
        adapter.apply_remote("apEnabled", &json!(true));
        adapter.apply_remote("apSsid", &json!("DMX-AP"));
        adapter.apply_remote("apChannel", &json!(6));

        let body = adapter.collect_form(FormTarget::Ap);
        assert_eq!(
            Value::Object(body),
            json!({
                "enabled": true,
                "apSsid": "DMX-AP",
                "apPassword": "",
                "apChannel": 6
            })
        );
    }

    #[test]
    fn collect_form_keeps_declaration_order() {
        let adapter = FieldSyncAdapter::default();
        let keys: Vec<String> = adapter.collect_form(FormTarget::Artnet).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            ["artnetNet", "artnetSubnet", "artnetUniverse", "dmxStartAddress"]
        );
    }

    #[test]
    fn live_controls_belong_to_no_form() {
        let adapter = FieldSyncAdapter::default();
        let pixel_test = adapter.get("pixelTest").unwrap();
        assert!(pixel_test.form.is_none());
        assert!(!adapter.collect_form(FormTarget::Pixel).contains_key("pixelTest"));
    }

    #[test]
    fn int_prefix_parsing() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("  -7dB"), Some(-7));
        assert_eq!(parse_int_prefix("+3"), Some(3));
        assert_eq!(parse_int_prefix("3.9"), Some(3));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix(""), None);
    }

    #[test]
    fn form_target_parses_case_insensitively() {
        assert_eq!("ArtNet".parse::<FormTarget>().unwrap(), FormTarget::Artnet);
        assert_eq!(FormTarget::Ap.to_string(), "ap");
        assert_eq!(FormTarget::Pixel.endpoint(), Endpoint::Pixel);
    }
}
