use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{EmsError, Result};
use crate::models::{ClientCredentials, ClientToken};
use crate::operations::{self, OperationDescriptor};
use crate::params::*;
use crate::recovery;
use crate::request::{Method, Params, PreparedRequest};

/// Header carrying the session token on every authenticated request.
pub const TOKEN_HEADER: &str = "x-ems-api-token";

// ---------------------------------------------------------------------------
// Internal request execution
// ---------------------------------------------------------------------------

/// Session state plus the configured HTTP client.
struct BaseClient {
    base_url: String,
    http: Client,
    timeout: Duration,
    token: Option<String>,
    default_page_size: Option<u32>,
    debug: bool,
}

impl BaseClient {
    fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: Self::build_http(config.timeout, config.debug)?,
            timeout: config.timeout,
            token: None,
            default_page_size: config.default_page_size,
            debug: config.debug,
        })
    }

    fn build_http(timeout: Duration, debug: bool) -> Result<Client> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connection_verbose(debug)
            .build()?;
        Ok(http)
    }

    /// Build the full URL for a resource path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Every resource but `clientauthentication` needs a session token.
    fn require_token(&self, path: &str) -> Result<()> {
        let authenticated = self.token.as_deref().is_some_and(|t| !t.is_empty());
        let resource = path.trim_start_matches('/');
        if resource != operations::CLIENT_AUTHENTICATION.path && !authenticated {
            return Err(EmsError::AuthenticationRequired {
                resource: path.to_string(),
            });
        }
        Ok(())
    }

    /// Run a declared operation with an already-built parameter mapping.
    fn dispatch(&self, op: &OperationDescriptor, mut params: Params) -> Result<Value> {
        let path = operations::render_path(op.path, &mut params)?;
        self.execute(op.method, &path, params, op.query_fields)
    }

    fn execute(
        &self,
        method: Method,
        path: &str,
        params: Params,
        query_fields: &[&str],
    ) -> Result<Value> {
        self.require_token(path)?;
        let request =
            PreparedRequest::build(method, path, params, self.default_page_size, query_fields);
        self.send(&request)
    }

    fn send(&self, request: &PreparedRequest) -> Result<Value> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };
        builder = builder.query(&request.query_pairs());
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(ref token) = self.token {
            builder = builder.header(TOKEN_HEADER, token.as_str());
        }

        debug!(method = %request.method, path = %request.path, "sending request");
        if self.debug {
            debug!(?request, "outgoing request");
        }

        match builder.send() {
            Ok(response) => self.handle_response(request, response),
            Err(e) => {
                let status = e.status().map(|s| s.as_u16());
                let message = self.failure_message(request, status, &e.to_string());
                warn!(path = %request.path, error = %e, "request did not complete");
                Err(EmsError::RequestFailed { status, message })
            }
        }
    }

    /// Decode a success body, or turn a failure body into `RequestFailed`.
    fn handle_response(&self, request: &PreparedRequest, response: Response) -> Result<Value> {
        let status = response.status().as_u16();
        let text = response.text().map_err(|e| EmsError::RequestFailed {
            status: Some(status),
            message: format!("Failed to read response body: {e}"),
        })?;
        debug!(status, bytes = text.len(), "received response");
        if self.debug {
            debug!(body = %text, "response body");
        }

        if (200..300).contains(&status) {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| EmsError::InvalidResponse {
                message: format!("response from {} is not JSON: {e}", request.path),
            });
        }

        let message = self.failure_message(request, Some(status), &text);
        warn!(status, path = %request.path, %message, "request failed");
        Err(EmsError::RequestFailed {
            status: Some(status),
            message,
        })
    }

    fn failure_message(&self, request: &PreparedRequest, status: Option<u16>, body: &str) -> String {
        if self.debug {
            return debug_dump(request, status, body);
        }
        recovery::failure_message(body).unwrap_or_else(|| {
            if !body.trim().is_empty() {
                body.to_string()
            } else if let Some(status) = status {
                format!("HTTP {status}")
            } else {
                "Request failed".to_string()
            }
        })
    }
}

/// Full dump of a failed exchange, used as the error message in debug mode.
fn debug_dump(request: &PreparedRequest, status: Option<u16>, body: &str) -> String {
    let response = match serde_json::from_str::<Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    };
    let status = status.map_or_else(|| "none".to_string(), |s| s.to_string());
    format!("{request:#?}\nstatus: {status}\nresponse: {response}")
}

// ---------------------------------------------------------------------------
// Public client
// ---------------------------------------------------------------------------

/// A session against the EMS Platform API.
///
/// ```no_run
/// use ems_platform_client::{ClientConfig, EmsClient, SearchParams};
///
/// let config = ClientConfig::new("https://ems.example.edu/EmsPlatform/api/v1")
///     .with_credentials("client-id", "secret")
///     .with_default_page_size(50);
/// let client = EmsClient::new(config).unwrap();
/// let areas = client.areas().list(&SearchParams::default()).unwrap();
/// println!("{areas:#}");
/// ```
pub struct EmsClient {
    base: BaseClient,
}

impl EmsClient {
    /// Open a session. Authenticates immediately when the configuration
    /// carries a non-empty client ID and secret.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let mut client = Self {
            base: BaseClient::new(&config)?,
        };
        if let Some((client_id, secret)) = config.login() {
            client.authenticate(client_id, secret)?;
        }
        Ok(client)
    }

    /// Open a session configured from `EMS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Exchange a client ID and secret for a session token.
    ///
    /// On failure the previous token, if any, is kept.
    pub fn authenticate(&mut self, client_id: &str, secret: &str) -> Result<()> {
        let params = ClientCredentials {
            client_id: client_id.to_string(),
            secret: secret.to_string(),
        }
        .to_params()?;
        let response = self.base.dispatch(&operations::CLIENT_AUTHENTICATION, params)?;

        let token: ClientToken =
            serde_json::from_value(response).map_err(|e| EmsError::InvalidResponse {
                message: format!("authentication response has no clientToken: {e}"),
            })?;
        if token.client_token.is_empty() {
            return Err(EmsError::InvalidResponse {
                message: "authentication returned an empty clientToken".into(),
            });
        }

        self.base.token = Some(token.client_token);
        info!(base_url = %self.base.base_url, "authenticated");
        Ok(())
    }

    pub fn client_token(&self) -> Option<&str> {
        self.base.token.as_deref()
    }

    pub fn debug_mode(&self) -> bool {
        self.base.debug
    }

    /// Toggle debug mode. Rebuilds the HTTP client so transport verbosity
    /// follows the flag.
    pub fn set_debug_mode(&mut self, debug: bool) -> Result<&mut Self> {
        if debug != self.base.debug {
            self.base.http = BaseClient::build_http(self.base.timeout, debug)?;
            self.base.debug = debug;
        }
        Ok(self)
    }

    pub fn default_page_size(&self) -> Option<u32> {
        self.base.default_page_size
    }

    pub fn set_default_page_size(&mut self, page_size: Option<u32>) -> &mut Self {
        self.base.default_page_size = page_size;
        self
    }

    /// Send a raw request. `method` must be `GET` or `POST`.
    ///
    /// Fields a known operation sends in the query string (such as
    /// `sendConfirmation` on reservation creation) are routed the same way
    /// here.
    pub fn request(&self, method: &str, path: &str, params: Params) -> Result<Value> {
        // A missing token is reported before an unsupported method.
        self.base.require_token(path)?;
        let method: Method = method.parse()?;
        let query_fields = operations::query_fields_for(method, path);
        self.base.execute(method, path, params, query_fields)
    }

    /// Call an operation by name with positional arguments, e.g.
    /// `call("getAreas", vec![json!(2), Value::Null, json!("lab")])`.
    ///
    /// Calling `clientAuthentication` this way returns the raw response and
    /// does not store the token; use [`authenticate`](Self::authenticate).
    pub fn call(&self, operation: &str, args: Vec<Value>) -> Result<Value> {
        let op = operations::descriptor(operation)?;
        let params = operations::reconstruct(operation, args)?;
        self.base.dispatch(op, params)
    }

    // -- sub-client accessors ------------------------------------------------

    pub fn areas(&self) -> AreasClient<'_> {
        AreasClient { base: &self.base }
    }

    pub fn bookings(&self) -> BookingsClient<'_> {
        BookingsClient { base: &self.base }
    }

    pub fn buildings(&self) -> BuildingsClient<'_> {
        BuildingsClient { base: &self.base }
    }

    pub fn categories(&self) -> CategoriesClient<'_> {
        CategoriesClient { base: &self.base }
    }

    pub fn contacts(&self) -> ContactsClient<'_> {
        ContactsClient { base: &self.base }
    }

    pub fn departments(&self) -> DepartmentsClient<'_> {
        DepartmentsClient { base: &self.base }
    }

    pub fn event_types(&self) -> EventTypesClient<'_> {
        EventTypesClient { base: &self.base }
    }

    pub fn groups(&self) -> GroupsClient<'_> {
        GroupsClient { base: &self.base }
    }

    pub fn reservations(&self) -> ReservationsClient<'_> {
        ReservationsClient { base: &self.base }
    }

    pub fn rooms(&self) -> RoomsClient<'_> {
        RoomsClient { base: &self.base }
    }

    pub fn setup_types(&self) -> SetupTypesClient<'_> {
        SetupTypesClient { base: &self.base }
    }

    pub fn statuses(&self) -> StatusesClient<'_> {
        StatusesClient { base: &self.base }
    }

    pub fn web_users(&self) -> WebUsersClient<'_> {
        WebUsersClient { base: &self.base }
    }
}

fn id_params(id: i64) -> Params {
    let mut params = Params::new();
    params.insert("id".into(), Value::from(id));
    params
}

// ===========================================================================
// Sub-clients
// ===========================================================================

// ---- Areas ----------------------------------------------------------------

pub struct AreasClient<'a> {
    base: &'a BaseClient,
}

impl AreasClient<'_> {
    /// List areas, filtered by optional query string parameters.
    pub fn list(&self, params: &SearchParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_AREAS, params.to_params()?)
    }
}

// ---- Bookings -------------------------------------------------------------

pub struct BookingsClient<'a> {
    base: &'a BaseClient,
}

impl BookingsClient<'_> {
    /// Get a booking by id.
    pub fn get(&self, id: i64) -> Result<Value> {
        self.base.dispatch(&operations::GET_BOOKING, id_params(id))
    }

    /// List a web user's bookings, sorted by event start time ascending.
    pub fn list(&self, params: &ListBookingsParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_BOOKINGS, params.to_params()?)
    }

    /// Search bookings with filters sent in the request body.
    pub fn search(&self, params: &SearchBookingsParams) -> Result<Value> {
        self.base.dispatch(&operations::SEARCH_BOOKINGS, params.to_params()?)
    }
}

// ---- Buildings ------------------------------------------------------------

pub struct BuildingsClient<'a> {
    base: &'a BaseClient,
}

impl BuildingsClient<'_> {
    pub fn list(&self, params: &SearchParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_BUILDINGS, params.to_params()?)
    }
}

// ---- Categories -----------------------------------------------------------

pub struct CategoriesClient<'a> {
    base: &'a BaseClient,
}

impl CategoriesClient<'_> {
    pub fn list(&self, params: &SearchParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_CATEGORIES, params.to_params()?)
    }
}

// ---- Contacts -------------------------------------------------------------

pub struct ContactsClient<'a> {
    base: &'a BaseClient,
}

impl ContactsClient<'_> {
    /// List contacts, optionally limited to one group.
    pub fn list(&self, params: &ContactsParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_CONTACTS, params.to_params()?)
    }
}

// ---- Departments ----------------------------------------------------------

pub struct DepartmentsClient<'a> {
    base: &'a BaseClient,
}

impl DepartmentsClient<'_> {
    pub fn list(&self, params: &DepartmentsParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_DEPARTMENTS, params.to_params()?)
    }
}

// ---- Event types ----------------------------------------------------------

pub struct EventTypesClient<'a> {
    base: &'a BaseClient,
}

impl EventTypesClient<'_> {
    pub fn list(&self, params: &EventTypesParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_EVENT_TYPES, params.to_params()?)
    }
}

// ---- Groups ---------------------------------------------------------------

pub struct GroupsClient<'a> {
    base: &'a BaseClient,
}

impl GroupsClient<'_> {
    pub fn list(&self, params: &SearchParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_GROUPS, params.to_params()?)
    }
}

// ---- Reservations ---------------------------------------------------------

pub struct ReservationsClient<'a> {
    base: &'a BaseClient,
}

impl ReservationsClient<'_> {
    /// Get a reservation by id.
    pub fn get(&self, id: i64) -> Result<Value> {
        self.base.dispatch(&operations::GET_RESERVATION, id_params(id))
    }

    /// Create a reservation. `send_confirmation` goes in the query string.
    pub fn create(&self, params: &CreateReservationParams) -> Result<Value> {
        self.base
            .dispatch(&operations::CREATE_RESERVATION, params.to_params()?)
    }
}

// ---- Rooms ----------------------------------------------------------------

pub struct RoomsClient<'a> {
    base: &'a BaseClient,
}

impl RoomsClient<'_> {
    pub fn list(&self, params: &RoomsParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_ROOMS, params.to_params()?)
    }
}

// ---- Setup types ----------------------------------------------------------

pub struct SetupTypesClient<'a> {
    base: &'a BaseClient,
}

impl SetupTypesClient<'_> {
    pub fn list(&self, params: &SearchParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_SETUP_TYPES, params.to_params()?)
    }
}

// ---- Statuses -------------------------------------------------------------

pub struct StatusesClient<'a> {
    base: &'a BaseClient,
}

impl StatusesClient<'_> {
    /// List all configured statuses.
    pub fn list(&self, params: &PageParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_STATUSES, params.to_params()?)
    }
}

// ---- Web users ------------------------------------------------------------

pub struct WebUsersClient<'a> {
    base: &'a BaseClient,
}

impl WebUsersClient<'_> {
    /// Search web users. The API takes the filters as a POST body.
    pub fn list(&self, params: &SearchParams) -> Result<Value> {
        self.base.dispatch(&operations::GET_WEB_USERS, params.to_params()?)
    }
}
