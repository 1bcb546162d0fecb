//! EMS Platform API client library for Rust.
//!
//! A blocking client for the EMS Platform room and event reservation REST
//! API. A session authenticates with a client ID and secret, then exposes one
//! method per resource (areas, bookings, buildings, reservations, rooms, web
//! users, ...). Responses are returned as opaque [`serde_json::Value`]s.
//!
//! # Quick Start
//!
//! ```no_run
//! use ems_platform_client::{ClientConfig, EmsClient, SearchBookingsParams, SearchParams};
//!
//! let config = ClientConfig::new("https://ems.example.edu/EmsPlatform/api/v1")
//!     .with_credentials("client-id", "secret")
//!     .with_default_page_size(25);
//! let client = EmsClient::new(config).unwrap();
//!
//! let buildings = client.buildings().list(&SearchParams::default()).unwrap();
//! println!("{buildings:#}");
//!
//! let bookings = client
//!     .bookings()
//!     .search(&SearchBookingsParams {
//!         building_ids: Some(vec![1, 4]),
//!         include_cancelled: Some(false),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! println!("{bookings:#}");
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod operations;
pub mod params;
pub mod recovery;
pub mod request;

// Re-export the main public types at the crate root for convenience.
pub use client::{
    AreasClient, BookingsClient, BuildingsClient, CategoriesClient, ContactsClient,
    DepartmentsClient, EmsClient, EventTypesClient, GroupsClient, ReservationsClient, RoomsClient,
    SetupTypesClient, StatusesClient, WebUsersClient, TOKEN_HEADER,
};
pub use config::ClientConfig;
pub use error::{EmsError, Result};
pub use operations::{descriptor, reconstruct, OperationDescriptor, ParamKind, ParamSpec};
pub use params::{
    ContactsParams, CreateReservationParams, DepartmentsParams, EventTypesParams,
    ListBookingsParams, PageParams, RoomsParams, SearchBookingsParams, SearchParams, ToParams,
};
pub use recovery::{failure_message, JsonFragments};
pub use request::{Method, Params, PreparedRequest};
