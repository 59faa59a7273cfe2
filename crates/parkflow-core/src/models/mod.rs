//! Data models for ParkFlow entities.
//!
//! The backend is a set of services that do not agree on field spelling,
//! so response models accept the known alternates (`id` / `vehicle_id`,
//! `plate` / `licence_plate` / `licencePlate`, ...). Money is always
//! [`MinorUnits`].
//!
//! - `Wallet`, `TopUpRequest`, `TopUpReceipt`: balance and top-ups
//! - `Vehicle`: registered plates
//! - `Reservation`, `NewReservation`: bookings
//! - `ParkingLocation`, `Occupancy`, `ReservationFee`: public search data
//! - `ParkingSession`, `HistoryStatistics`: past sessions
//! - Account types: login, registration, profile

pub mod account;
pub mod history;
pub mod id;
pub mod money;
pub mod parking;
pub mod reservation;
pub mod vehicle;
pub mod wallet;

pub use account::{
    AuthMessage, ChangePasswordRequest, LoginRequest, LoginResponse, Profile, RegisterRequest,
    ResendVerificationRequest,
};
pub use history::{format_duration, HistoryStatistics, ParkingSession};
pub use id::{Created, EntityId};
pub use money::MinorUnits;
pub use parking::{Occupancy, ParkingLocation, ReservationFee, DEFAULT_CURRENCY};
pub use reservation::{NewReservation, Reservation};
pub use vehicle::{normalize_plate, Vehicle};
pub use wallet::{TopUpReceipt, TopUpRequest, Wallet, DEFAULT_PAYMENT_METHOD, PAYMENT_METHODS};
