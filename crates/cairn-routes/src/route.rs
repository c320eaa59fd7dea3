use std::fmt;

use cairn_lifecycle::Storable;
use cairn_store::Model;
use cairn_types::{ObjType, ObjectId, Record, Timestamp, TypeError, TypeResult};
use serde_json::Value;

/// Type tag under which routes are stored.
pub const ROUTE_TYPE: &str = "object_route";

/// A slug and locale pointing at a target object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRoute {
    pub id: Option<ObjectId>,
    /// Only active routes take part in uniqueness checks and lookups.
    pub active: bool,
    pub slug: Option<String>,
    pub lang: Option<String>,
    pub creation_date: Option<Timestamp>,
    pub last_modification_date: Option<Timestamp>,
    /// Type tag of the target object.
    pub route_obj_type: Option<String>,
    pub route_obj_id: Option<ObjectId>,
    /// Template used to render the target.
    pub route_template: Option<String>,
    /// Free-form template options.
    pub route_options: Option<Value>,
    pub route_options_ident: Option<String>,
}

impl Default for ObjectRoute {
    fn default() -> Self {
        Self {
            id: None,
            active: true,
            slug: None,
            lang: None,
            creation_date: None,
            last_modification_date: None,
            route_obj_type: None,
            route_obj_id: None,
            route_template: None,
            route_options: None,
            route_options_ident: None,
        }
    }
}

impl ObjectRoute {
    pub fn new(slug: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            lang: Some(lang.into()),
            ..Self::default()
        }
    }

    /// Builder-style target setter.
    pub fn pointing_at(mut self, obj_type: impl Into<ObjType>, id: impl Into<ObjectId>) -> Self {
        let obj_type: ObjType = obj_type.into();
        self.route_obj_type = Some(obj_type.as_str().to_string());
        self.route_obj_id = Into::<ObjectId>::into(id).normalize();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.route_template = Some(template.into());
        self
    }

    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }

    /// Set the template options from JSON text. Blank text clears them.
    pub fn set_route_options_json(&mut self, json: &str) -> TypeResult<()> {
        if json.trim().is_empty() {
            self.route_options = None;
            return Ok(());
        }
        let value: Value =
            serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))?;
        self.route_options = Some(value);
        Ok(())
    }

    /// Whether `other` points at the same target in the same locale.
    pub fn same_target(&self, other: &ObjectRoute) -> bool {
        self.route_obj_id == other.route_obj_id
            && self.route_obj_type == other.route_obj_type
            && self.lang == other.lang
    }
}

impl fmt::Display for ObjectRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Model for ObjectRoute {
    fn obj_type(&self) -> ObjType {
        ROUTE_TYPE.into()
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(ROUTE_TYPE).with("active", self.active);
        record.id = self.id.clone();
        record.set_opt_str("slug", self.slug.as_deref());
        record.set_opt_str("lang", self.lang.as_deref());
        record.set_timestamp("creation_date", self.creation_date);
        record.set_timestamp("last_modification_date", self.last_modification_date);
        record.set_opt_str("route_obj_type", self.route_obj_type.as_deref());
        record.set(
            "route_obj_id",
            self.route_obj_id.as_ref().map_or(Value::Null, ObjectId::to_value),
        );
        record.set_opt_str("route_template", self.route_template.as_deref());
        record.set("route_options", self.route_options.clone().unwrap_or(Value::Null));
        record.set_opt_str("route_options_ident", self.route_options_ident.as_deref());
        record
    }

    fn from_record(record: &Record) -> TypeResult<Self> {
        let route_options = match record.get("route_options") {
            None => None,
            Some(Value::String(text)) if text.trim().is_empty() => None,
            Some(Value::String(text)) => Some(
                serde_json::from_str(text).map_err(|e| TypeError::Serialization(e.to_string()))?,
            ),
            Some(other) => Some(other.clone()),
        };
        Ok(Self {
            id: record.id.clone(),
            active: record.get_bool("active")?.unwrap_or(true),
            slug: record.get_str("slug")?,
            lang: record.get_str("lang")?,
            creation_date: record.get_timestamp("creation_date")?,
            last_modification_date: record.get_timestamp("last_modification_date")?,
            route_obj_type: record.get_str("route_obj_type")?,
            route_obj_id: record.get_id("route_obj_id")?,
            route_template: record.get_str("route_template")?,
            route_options,
            route_options_ident: record.get_str("route_options_ident")?,
        })
    }
}

impl Storable for ObjectRoute {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn new_routes_are_active() {
        let route = ObjectRoute::new("about", "en");
        assert!(route.active);
        assert_eq!(route.to_string(), "about");
    }

    #[test]
    fn target_ids_are_normalized() {
        let route = ObjectRoute::new("about", "en").pointing_at("page", "12");
        assert_eq!(route.route_obj_id, Some(ObjectId::Int(12)));
        assert_eq!(route.route_obj_type.as_deref(), Some("page"));
    }

    #[test]
    fn options_parse_from_json_text() {
        let mut route = ObjectRoute::default();
        route.set_route_options_json(r#"{"layout": "wide"}"#).unwrap();
        assert_eq!(route.route_options, Some(json!({"layout": "wide"})));

        let err = route.set_route_options_json("{oops").unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));

        route.set_route_options_json("  ").unwrap();
        assert!(route.route_options.is_none());
    }

    #[test]
    fn same_target_compares_type_id_and_lang() {
        let a = ObjectRoute::new("a", "en").pointing_at("page", 1);
        let b = ObjectRoute::new("b", "en").pointing_at("page", 1);
        let c = ObjectRoute::new("a", "fr").pointing_at("page", 1);
        assert!(a.same_target(&b));
        assert!(!a.same_target(&c));
    }

    #[test]
    fn record_round_trip() {
        let mut route = ObjectRoute::new("about", "en")
            .pointing_at("page", 3)
            .with_template("page/default");
        route.id = Some(ObjectId::Int(9));
        route.creation_date = Some(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap());
        route.route_options = Some(json!({"sidebar": false}));

        let back = ObjectRoute::from_record(&route.to_record()).unwrap();
        assert_eq!(back, route);
    }

    #[test]
    fn options_stored_as_text_are_decoded() {
        let record = Record::new(ROUTE_TYPE)
            .with("slug", "x")
            .with("route_options", r#"{"a": 1}"#);
        let route = ObjectRoute::from_record(&record).unwrap();
        assert_eq!(route.route_options, Some(json!({"a": 1})));
        assert!(route.active);
    }
}
