use std::net::Ipv4Addr;

use cairn_lifecycle::{
    HookContext, HookDecision, LifecycleHook, LifecycleResult, Operation, Storable,
};
use cairn_store::Model;
use cairn_types::{parse_timestamp, Clock, ObjType, ObjectId, Record, Timestamp, TypeResult};
use serde_json::Value;

/// Type tag under which user submissions are stored.
pub const USER_DATA_TYPE: &str = "user_data";

/// Data submitted by an end user: a contact form entry, a vote, a comment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserData {
    pub id: Option<ObjectId>,
    /// Client IPv4 address as an integer.
    pub ip: Option<i64>,
    pub lang: Option<String>,
    /// Source URL or identifier of the submission.
    pub origin: Option<String>,
    /// When the submission was created.
    pub ts: Option<Timestamp>,
}

impl UserData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client address from dynamic input.
    ///
    /// Dotted IPv4 text is packed into an integer, numbers are taken as-is,
    /// and anything else is recorded as `0`.
    pub fn set_ip(&mut self, value: &Value) {
        self.ip = match value {
            Value::Null => None,
            Value::Number(n) => {
                Some(n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0))
            }
            Value::String(s) => Some(ip_to_int(s)),
            _ => Some(0),
        };
    }

    /// Set the submission time from text. `"now"` reads the clock.
    pub fn set_ts(&mut self, input: Option<&str>, clock: &dyn Clock) -> TypeResult<()> {
        self.ts = input.map(|text| parse_timestamp(text, clock)).transpose()?;
        Ok(())
    }

    /// Dotted form of the stored address, if it is a valid IPv4 value.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        let ip = u32::try_from(self.ip?).ok()?;
        Some(Ipv4Addr::from(ip))
    }
}

fn ip_to_int(text: &str) -> i64 {
    let text = text.trim();
    if let Ok(addr) = text.parse::<Ipv4Addr>() {
        return i64::from(u32::from(addr));
    }
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        .unwrap_or(0)
}

impl Model for UserData {
    fn obj_type(&self) -> ObjType {
        USER_DATA_TYPE.into()
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(USER_DATA_TYPE);
        record.id = self.id.clone();
        record.set("ip", self.ip.map_or(Value::Null, Value::from));
        record.set_opt_str("lang", self.lang.as_deref());
        record.set_opt_str("origin", self.origin.as_deref());
        record.set_timestamp("ts", self.ts);
        record
    }

    fn from_record(record: &Record) -> TypeResult<Self> {
        let mut data = Self {
            id: record.id.clone(),
            lang: record.get_str("lang")?,
            origin: record.get_str("origin")?,
            ts: record.get_timestamp("ts")?,
            ..Self::default()
        };
        data.set_ip(record.fields.get("ip").unwrap_or(&Value::Null));
        Ok(data)
    }
}

impl Storable for UserData {}

/// Stamps `ts` with the lifecycle clock when a submission is created.
#[derive(Clone, Copy, Debug, Default)]
pub struct UserDataHook;

impl LifecycleHook<UserData> for UserDataHook {
    fn name(&self) -> &str {
        "user_data"
    }

    fn pre(&self, data: &mut UserData, ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
        if ctx.operation == Operation::Create {
            data.ts = Some(ctx.now());
        }
        Ok(HookDecision::Proceed)
    }
}
