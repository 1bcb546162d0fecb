//! Operation descriptors and positional parameter reconstruction.
//!
//! Each API operation is declared once as a static [`OperationDescriptor`]:
//! its HTTP method, path template and ordered parameter list. The typed
//! sub-clients dispatch through these descriptors, and [`reconstruct`] lets a
//! caller supply arguments positionally instead.

use serde_json::{Number, Value};

use crate::error::{EmsError, Result};
use crate::request::{Method, Params};

use ParamKind::*;

/// Declared type of an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Bool,
    Str,
    /// List of record IDs; elements are coerced to integers.
    IdList,
    List,
    /// Opaque JSON value.
    Any,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

const fn p(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec { name, kind }
}

/// Static description of one API operation.
#[derive(Debug)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub method: Method,
    /// Resource path; `{name}` segments are filled from the parameters.
    pub path: &'static str,
    pub params: &'static [ParamSpec],
    /// Fields sent in the query string even when the method is POST.
    pub query_fields: &'static [&'static str],
}

pub static CLIENT_AUTHENTICATION: OperationDescriptor = OperationDescriptor {
    name: "clientAuthentication",
    method: Method::Post,
    path: "clientauthentication",
    params: &[p("clientId", Str), p("secret", Str)],
    query_fields: &[],
};

pub static GET_AREAS: OperationDescriptor = OperationDescriptor {
    name: "getAreas",
    method: Method::Get,
    path: "areas",
    params: &[p("page", Int), p("pageSize", Int), p("searchText", Str)],
    query_fields: &[],
};

pub static GET_BOOKING: OperationDescriptor = OperationDescriptor {
    name: "getBooking",
    method: Method::Get,
    path: "bookings/{id}",
    params: &[p("id", Int)],
    query_fields: &[],
};

pub static GET_BOOKINGS: OperationDescriptor = OperationDescriptor {
    name: "getBookings",
    method: Method::Get,
    path: "bookings",
    params: &[
        p("webUserId", Int),
        p("page", Int),
        p("pageSize", Int),
        p("minReserveStartTime", Str),
        p("maxReserveStartTime", Str),
        p("originalEventStartTime", Str),
        p("roomId", Int),
        p("buildingId", Int),
        p("statusId", Int),
        p("roomTypeId", Int),
        p("floorId", Int),
        p("eventTypeId", Int),
        p("reservationId", Int),
        p("searchText", Str),
        p("includeCancelled", Bool),
        p("userBookingsOnly", Bool),
        p("includeComponentRooms", Bool),
        p("excludeOverrideDescriptionRooms", Bool),
        p("udf", Str),
        p("kioskProfileId", Int),
    ],
    query_fields: &[],
};

pub static SEARCH_BOOKINGS: OperationDescriptor = OperationDescriptor {
    name: "searchBookings",
    method: Method::Post,
    path: "bookings/actions/search",
    params: &[
        p("page", Int),
        p("pageSize", Int),
        p("buildingIds", IdList),
        p("eventTypeIds", IdList),
        p("excludeOverrideDescriptionRooms", Bool),
        p("floorIds", IdList),
        p("groupIds", IdList),
        p("includeCancelled", Bool),
        p("includeComponentRooms", Bool),
        p("kioskProfileId", Int),
        p("maxReserveStartTime", Str),
        p("minReserveStartTime", Str),
        p("originalEventStartTime", Str),
        p("reservationId", Any),
        p("reservationIds", IdList),
        p("roomIds", IdList),
        p("roomTypeIds", IdList),
        p("searchText", Str),
        p("statusIds", IdList),
        p("udfSearch", List),
        p("userBookingsOnly", Bool),
        p("webUserId", Any),
    ],
    query_fields: &[],
};

pub static GET_BUILDINGS: OperationDescriptor = OperationDescriptor {
    name: "getBuildings",
    method: Method::Get,
    path: "buildings",
    params: &[p("page", Int), p("pageSize", Int), p("searchText", Str)],
    query_fields: &[],
};

pub static GET_CATEGORIES: OperationDescriptor = OperationDescriptor {
    name: "getCategories",
    method: Method::Get,
    path: "categories",
    params: &[p("page", Int), p("pageSize", Int), p("searchText", Str)],
    query_fields: &[],
};

pub static GET_CONTACTS: OperationDescriptor = OperationDescriptor {
    name: "getContacts",
    method: Method::Get,
    path: "contacts",
    params: &[
        p("page", Int),
        p("pageSize", Int),
        p("groupId", Int),
        p("searchText", Str),
    ],
    query_fields: &[],
};

pub static GET_DEPARTMENTS: OperationDescriptor = OperationDescriptor {
    name: "getDepartments",
    method: Method::Get,
    path: "departments",
    params: &[
        p("page", Int),
        p("pageSize", Int),
        p("active", Bool),
        p("searchText", Str),
    ],
    query_fields: &[],
};

pub static GET_EVENT_TYPES: OperationDescriptor = OperationDescriptor {
    name: "getEventTypes",
    method: Method::Get,
    path: "eventtypes",
    params: &[
        p("page", Int),
        p("pageSize", Int),
        p("active", Bool),
        p("searchText", Str),
        p("displayOnWeb", Bool),
        p("allowWebRequest", Bool),
    ],
    query_fields: &[],
};

pub static GET_GROUPS: OperationDescriptor = OperationDescriptor {
    name: "getGroups",
    method: Method::Get,
    path: "groups",
    params: &[p("page", Int), p("pageSize", Int), p("searchText", Str)],
    query_fields: &[],
};

pub static GET_RESERVATION: OperationDescriptor = OperationDescriptor {
    name: "getReservation",
    method: Method::Get,
    path: "reservations/{id}",
    params: &[p("id", Int)],
    query_fields: &[],
};

pub static CREATE_RESERVATION: OperationDescriptor = OperationDescriptor {
    name: "createReservation",
    method: Method::Post,
    path: "reservations/actions/create",
    params: &[
        p("sendConfirmation", Bool),
        p("eventName", Str),
        p("eventTypeId", Int),
        p("groupId", Int),
        p("contactId", Int),
        p("webUserId", Int),
        p("templateId", Int),
        p("bookings", List),
        p("userDefinedFields", List),
        p("comments", List),
    ],
    query_fields: &["sendConfirmation"],
};

pub static GET_ROOMS: OperationDescriptor = OperationDescriptor {
    name: "getRooms",
    method: Method::Get,
    path: "rooms",
    params: &[
        p("page", Int),
        p("pageSize", Int),
        p("buildingId", Int),
        p("roomTypeId", Int),
        p("searchText", Str),
    ],
    query_fields: &[],
};

pub static GET_SETUP_TYPES: OperationDescriptor = OperationDescriptor {
    name: "getSetupTypes",
    method: Method::Get,
    path: "setuptypes",
    params: &[p("page", Int), p("pageSize", Int), p("searchText", Str)],
    query_fields: &[],
};

pub static GET_STATUSES: OperationDescriptor = OperationDescriptor {
    name: "getStatuses",
    method: Method::Get,
    path: "statuses",
    params: &[p("page", Int), p("pageSize", Int)],
    query_fields: &[],
};

pub static GET_WEB_USERS: OperationDescriptor = OperationDescriptor {
    name: "getWebUsers",
    method: Method::Post,
    path: "webusers/actions/search",
    params: &[p("page", Int), p("pageSize", Int), p("searchText", Str)],
    query_fields: &[],
};

/// Every operation the client knows about.
pub static OPERATIONS: &[&OperationDescriptor] = &[
    &CLIENT_AUTHENTICATION,
    &GET_AREAS,
    &GET_BOOKING,
    &GET_BOOKINGS,
    &SEARCH_BOOKINGS,
    &GET_BUILDINGS,
    &GET_CATEGORIES,
    &GET_CONTACTS,
    &GET_DEPARTMENTS,
    &GET_EVENT_TYPES,
    &GET_GROUPS,
    &GET_RESERVATION,
    &CREATE_RESERVATION,
    &GET_ROOMS,
    &GET_SETUP_TYPES,
    &GET_STATUSES,
    &GET_WEB_USERS,
];

/// Look up an operation by name.
pub fn descriptor(name: &str) -> Result<&'static OperationDescriptor> {
    OPERATIONS
        .iter()
        .copied()
        .find(|op| op.name == name)
        .ok_or_else(|| EmsError::configuration(format!("unknown operation '{name}'")))
}

/// Fields an operation routes to the query string on POST, looked up by
/// method and resolved path. Unknown paths route nothing.
pub fn query_fields_for(method: Method, path: &str) -> &'static [&'static str] {
    let path = path.trim_start_matches('/');
    OPERATIONS
        .iter()
        .find(|op| op.method == method && op.path == path)
        .map_or(&[], |op| op.query_fields)
}

/// Pair positional arguments with an operation's declared parameters.
///
/// Parameters past the last supplied argument are left out of the mapping
/// entirely; no declared default is substituted for them.
pub fn reconstruct(operation: &str, args: Vec<Value>) -> Result<Params> {
    let op = descriptor(operation)?;
    if args.len() > op.params.len() {
        return Err(EmsError::configuration(format!(
            "{} accepts {} parameters, {} supplied",
            op.name,
            op.params.len(),
            args.len()
        )));
    }

    let mut params = Params::new();
    for (spec, value) in op.params.iter().zip(args) {
        let value = coerce(op.name, spec, value)?;
        params.insert(spec.name.to_string(), value);
    }
    Ok(params)
}

fn coerce(operation: &str, spec: &ParamSpec, value: Value) -> Result<Value> {
    let mismatch = |value: &Value| {
        EmsError::configuration(format!(
            "{operation}: parameter '{}' expects {:?}, got {value}",
            spec.name, spec.kind
        ))
    };

    match (spec.kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (Any, value) => Ok(value),
        (Int, value) => to_integer(&value).ok_or_else(|| mismatch(&value)),
        (Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (Str, Value::String(s)) => Ok(Value::String(s)),
        (Str, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (List, Value::Array(items)) => Ok(Value::Array(items)),
        (IdList, Value::Array(items)) => {
            let mut ids = Vec::with_capacity(items.len());
            for item in &items {
                ids.push(to_integer(item).ok_or_else(|| mismatch(item))?);
            }
            Ok(Value::Array(ids))
        }
        (_, value) => Err(mismatch(&value)),
    }
}

fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::Number(n.clone())),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| Value::Number(Number::from(f as i64))),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

/// Fill `{name}` segments of a path template, removing the used parameters.
pub fn render_path(template: &str, params: &mut Params) -> Result<String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let close = rest[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| EmsError::configuration(format!("malformed path '{template}'")))?;
        let name = &rest[open + 1..close];
        let value = match params.remove(name) {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(EmsError::configuration(format!(
                    "path '{template}' requires parameter '{name}'"
                )))
            }
        };
        path.push_str(&rest[..open]);
        path.push_str(&value);
        rest = &rest[close + 1..];
    }
    path.push_str(rest);
    Ok(path)
}
