//! Typed operations for each gateway endpoint.
//!
//! These are thin: build the path, send through [`ApiClient::send`], decode.
//! None of them auto-redirect on 401; page loaders decide that (see
//! `crate::loader`).

use tracing::{debug, info, warn};

use super::client::{ApiClient, RequestContext, ResponseBody};
use super::ApiError;
use crate::models::history::HistoryResponse;
use crate::models::reservation::ReservationsResponse;
use crate::models::vehicle::VehiclesResponse;
use crate::models::{
    normalize_plate, AuthMessage, ChangePasswordRequest, Created, EntityId, HistoryStatistics,
    LoginRequest, LoginResponse, MinorUnits, NewReservation, Occupancy, ParkingLocation,
    ParkingSession, Profile, RegisterRequest, Reservation, ReservationFee, ResendVerificationRequest,
    TopUpReceipt, TopUpRequest, Vehicle, Wallet,
};

/// Append a url-encoded query string to `path`
fn with_query(path: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
    let query = serde_urlencoded::to_string(params).map_err(|e| ApiError::Encode(e.to_string()))?;
    if query.is_empty() {
        Ok(path.to_string())
    } else {
        Ok(format!("{}?{}", path, query))
    }
}

/// Auth endpoints answer with `{message}` JSON or a bare text line
fn into_message(body: ResponseBody) -> AuthMessage {
    match body {
        ResponseBody::Json(value) => serde_json::from_value(value).unwrap_or_default(),
        ResponseBody::Text(text) if text.trim().is_empty() => AuthMessage::default(),
        ResponseBody::Text(text) => AuthMessage {
            message: Some(text.trim().to_string()),
        },
    }
}

impl ApiClient {
    // ===== Account =====

    /// Exchange credentials for a token and store it. Returns the token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send(RequestContext::post("/api/auth/login").public().with_json(&request)?)
            .await?
            .json()?;

        if response.token.is_empty() {
            return Err(ApiError::Decode("login response carried an empty token".to_string()));
        }
        self.tokens().set(Some(&response.token))?;
        info!(email = %request.email, "Logged in");
        Ok(response.token)
    }

    /// End the session locally and on the backend.
    /// Unlike `redirect_to_login`, waits for the backend notification.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.tokens().clear()?;
        self.notify_logout().await;
        info!("Logged out");
        Ok(())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthMessage, ApiError> {
        let body = self
            .send(RequestContext::post("/api/auth/register").public().with_json(request)?)
            .await?;
        Ok(into_message(body))
    }

    pub async fn verify_email(&self, token: &str) -> Result<AuthMessage, ApiError> {
        let path = with_query("/api/auth/verify", &[("token", token)])?;
        let body = self.send(RequestContext::get(path).public()).await?;
        Ok(into_message(body))
    }

    pub async fn resend_verification(&self, email: &str) -> Result<AuthMessage, ApiError> {
        let request = ResendVerificationRequest {
            email: email.trim().to_string(),
        };
        let body = self
            .send(RequestContext::post("/api/auth/resend-verification").public().with_json(&request)?)
            .await?;
        Ok(into_message(body))
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.get("/customer/profile", true).await?.json()
    }

    pub async fn update_profile(&self, first_name: &str, last_name: &str) -> Result<(), ApiError> {
        let path = with_query(
            "/customer/profile",
            &[("firstName", first_name.trim()), ("lastName", last_name.trim())],
        )?;
        self.put(&path, None, true).await?;
        Ok(())
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        let request = ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        self.send(RequestContext::put("/customer/password").with_json(&request)?)
            .await?;
        Ok(())
    }

    /// Delete the account. The token is cleared once the backend confirms.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.delete("/customer/account", true).await?;
        self.tokens().clear()?;
        info!("Account deleted");
        Ok(())
    }

    // ===== Wallet =====

    pub async fn wallet(&self) -> Result<Wallet, ApiError> {
        self.get("/customer/wallet", true).await?.json()
    }

    pub async fn top_up(&self, amount: MinorUnits, method: &str) -> Result<TopUpReceipt, ApiError> {
        let request = TopUpRequest {
            amount_minor: amount,
            payment_method: method.to_string(),
        };
        let receipt: TopUpReceipt = self
            .send(RequestContext::post("/customer/wallet/topup").with_json(&request)?)
            .await?
            .json()?;
        info!(amount = amount.get(), method, "Wallet topped up");
        Ok(receipt)
    }

    // ===== Vehicles =====

    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        let response: VehiclesResponse = self.get("/customer/vehicles", true).await?.json()?;
        Ok(response.into_vec())
    }

    /// Register a plate. Plates are stored upper-cased.
    pub async fn add_vehicle(&self, plate: &str) -> Result<Vehicle, ApiError> {
        let plate = normalize_plate(plate);
        let path = with_query("/customer/vehicles", &[("licencePlate", plate.as_str())])?;
        let created: Created = self.post(&path, None, true).await?.json()?;
        Ok(Vehicle {
            id: created.id,
            plate,
        })
    }

    pub async fn update_vehicle(&self, id: &EntityId, plate: &str) -> Result<Vehicle, ApiError> {
        let plate = normalize_plate(plate);
        let path = with_query(
            &format!("/customer/vehicles/{}", id),
            &[("licencePlate", plate.as_str())],
        )?;
        self.put(&path, None, true).await?;
        Ok(Vehicle {
            id: id.clone(),
            plate,
        })
    }

    pub async fn delete_vehicle(&self, id: &EntityId) -> Result<(), ApiError> {
        self.delete(&format!("/customer/vehicles/{}", id), true).await?;
        Ok(())
    }

    // ===== Reservations =====

    pub async fn reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        let response: ReservationsResponse = self.get("/customer/reservations", true).await?.json()?;
        Ok(response.into_vec())
    }

    /// Book a spot. Returns the new reservation id.
    pub async fn create_reservation(&self, reservation: &NewReservation) -> Result<EntityId, ApiError> {
        let query = reservation.query();
        let params: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let path = with_query("/customer/reservations", &params)?;
        let created: Created = self.post(&path, None, true).await?.json()?;
        info!(id = %created.id, parking = %reservation.parking_id, "Reservation created");
        Ok(created.id)
    }

    // ===== History =====

    pub async fn history(&self) -> Result<Vec<ParkingSession>, ApiError> {
        let response: HistoryResponse = self.get("/customer/history", true).await?.json()?;
        Ok(response.into_vec())
    }

    pub async fn history_statistics(&self) -> Result<HistoryStatistics, ApiError> {
        self.get("/customer/history/statistics", true).await?.json()
    }

    pub async fn pay_session(&self, id: &EntityId) -> Result<(), ApiError> {
        self.post(&format!("/customer/history/{}/pay", id), None, true).await?;
        Ok(())
    }

    // ===== Parking search (public) =====

    pub async fn parking_locations(&self, location: Option<&str>) -> Result<Vec<ParkingLocation>, ApiError> {
        let path = match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => with_query("/parking/locations", &[("location", location)])?,
            None => "/parking/locations".to_string(),
        };
        self.get(&path, false).await?.json()
    }

    pub async fn parking_details(&self, id: &EntityId) -> Result<ParkingLocation, ApiError> {
        self.get(&format!("/parking/locations/{}/details", id), false)
            .await?
            .json()
    }

    /// Occupancy chart data. Falls back to the built-in sample series when
    /// the backend has none, so the chart always renders.
    pub async fn occupancy(&self, id: &EntityId) -> Occupancy {
        let result = self
            .get(&format!("/parking/locations/{}/occupancy", id), false)
            .await
            .and_then(ResponseBody::json::<Occupancy>);
        match result {
            Ok(occupancy) => occupancy,
            Err(e) => {
                warn!(parking = %id, error = %e, "Occupancy unavailable, using sample data");
                Occupancy::sample()
            }
        }
    }

    pub async fn reservation_fee(&self, id: &EntityId) -> Result<MinorUnits, ApiError> {
        let fee: ReservationFee = self
            .get(&format!("/parking/pricing/{}/reservation-fee", id), false)
            .await?
            .json()?;
        debug!(parking = %id, fee = fee.reservation_fee_minor.get(), "Reservation fee");
        Ok(fee.reservation_fee_minor)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime};
    use reqwest::Method;

    use super::*;
    use crate::api::transport::TransportError;
    use crate::test_support::{client_with, fresh_token, json_response, text_response, FakeTransport};

    fn ok(body: &str) -> Arc<FakeTransport> {
        let body = body.to_string();
        Arc::new(FakeTransport::new(move |_| Ok(json_response(200, &body))))
    }

    // ---------------------------------------------------------------------------
    // Account
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_stores_token() {
        let token = fresh_token();
        let transport = ok(&format!(r#"{{"token":"{}"}}"#, token));
        let (client, _) = client_with(Arc::clone(&transport), None);

        let returned = client.login(" driver@example.com ", "secret").await.unwrap();

        assert_eq!(returned, token);
        assert_eq!(client.tokens().get(), Some(token));
        let request = &transport.requests()[0];
        assert!(request.bearer.is_none());
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "driver@example.com");
    }

    #[tokio::test]
    async fn test_login_rejected_leaves_no_token() {
        let transport = Arc::new(FakeTransport::always(json_response(
            400,
            r#"{"error":"Invalid credentials"}"#,
        )));
        let (client, _) = client_with(transport, None);

        let err = client.login("driver@example.com", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(client.tokens().get().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_and_notifies() {
        let transport = ok("{}");
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));

        client.logout().await.unwrap();

        assert!(client.tokens().get().is_none());
        assert_eq!(transport.calls_to("/api/auth/logout"), 1);
    }

    #[tokio::test]
    async fn test_verify_email_encodes_token() {
        let transport = Arc::new(FakeTransport::always(text_response(200, "Email verified")));
        let (client, _) = client_with(Arc::clone(&transport), None);

        let message = client.verify_email("a+b/c=").await.unwrap();

        assert_eq!(message.message.as_deref(), Some("Email verified"));
        assert_eq!(
            transport.requests()[0].url,
            "http://parkflow.test/api/auth/verify?token=a%2Bb%2Fc%3D"
        );
    }

    #[tokio::test]
    async fn test_update_profile_uses_query() {
        let transport = ok("");
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));

        client.update_profile("Ada", "Love lace").await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::PUT);
        assert_eq!(
            request.url,
            "http://parkflow.test/customer/profile?firstName=Ada&lastName=Love+lace"
        );
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_delete_account_clears_token() {
        let transport = ok("");
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));

        client.delete_account().await.unwrap();

        assert!(client.tokens().get().is_none());
        assert_eq!(transport.requests()[0].method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_delete_account_failure_keeps_token() {
        let transport = Arc::new(FakeTransport::always(json_response(500, r#"{"error":"db down"}"#)));
        let token = fresh_token();
        let (client, _) = client_with(transport, Some(&token));

        assert!(client.delete_account().await.is_err());
        assert_eq!(client.tokens().get(), Some(token));
    }

    // ---------------------------------------------------------------------------
    // Wallet and vehicles
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_top_up_sends_minor_units() {
        let transport = ok(r#"{"paymentId":"p-1","newBalance":2550}"#);
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));

        let receipt = client.top_up(MinorUnits(1050), "blik").await.unwrap();

        assert_eq!(receipt.new_balance, MinorUnits(2550));
        let body: serde_json::Value =
            serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"amountMinor": 1050, "paymentMethod": "blik"}));
    }

    #[tokio::test]
    async fn test_add_vehicle_upper_cases_plate() {
        let transport = ok(r#"{"id":9}"#);
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));

        let vehicle = client.add_vehicle(" wa 123ab ").await.unwrap();

        assert_eq!(vehicle.plate, "WA 123AB");
        assert_eq!(vehicle.id, EntityId::from(9));
        assert_eq!(
            transport.requests()[0].url,
            "http://parkflow.test/customer/vehicles?licencePlate=WA+123AB"
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_vehicle_paths() {
        let transport = ok("");
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));
        let id = EntityId::from(4);

        client.update_vehicle(&id, "kr1").await.unwrap();
        client.delete_vehicle(&id).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].url, "http://parkflow.test/customer/vehicles/4?licencePlate=KR1");
        assert_eq!(requests[1].method, Method::DELETE);
        assert_eq!(requests[1].url, "http://parkflow.test/customer/vehicles/4");
    }

    #[tokio::test]
    async fn test_vehicles_wrapped_response() {
        let transport = ok(r#"{"vehicles":[{"vehicle_id":1,"licence_plate":"WA1"}]}"#);
        let (client, _) = client_with(transport, Some(&fresh_token()));

        let vehicles = client.vehicles().await.unwrap();

        assert_eq!(vehicles, vec![Vehicle { id: EntityId::from(1), plate: "WA1".into() }]);
    }

    // ---------------------------------------------------------------------------
    // Reservations and history
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_reservation_query() {
        let transport = ok(r#"{"id":"R-77"}"#);
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));
        let new = NewReservation {
            parking_id: EntityId::from(3),
            spot_id: Some(EntityId::from("B2")),
            date: NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            duration_secs: None,
        };

        let id = client.create_reservation(&new).await.unwrap();

        assert_eq!(id, EntityId::from("R-77"));
        assert_eq!(
            transport.requests()[0].url,
            "http://parkflow.test/customer/reservations?parkingId=3&spotId=B2&startDateTime=2026-01-07T14%3A00%3A00Z&durationSeconds=7200"
        );
    }

    #[tokio::test]
    async fn test_history_bare_list() {
        let transport = ok(r#"[{"id":1,"costMinor":450,"isPaid":false},{"id":2,"costMinor":900,"isPaid":true}]"#);
        let (client, _) = client_with(transport, Some(&fresh_token()));

        let sessions = client.history().await.unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].cost(), MinorUnits(900));
    }

    #[tokio::test]
    async fn test_pay_session_path() {
        let transport = ok("");
        let (client, _) = client_with(Arc::clone(&transport), Some(&fresh_token()));

        client.pay_session(&EntityId::from(12)).await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "http://parkflow.test/customer/history/12/pay");
    }

    #[tokio::test]
    async fn test_customer_calls_need_a_token() {
        let transport = ok("{}");
        let (client, redirects) = client_with(Arc::clone(&transport), None);

        let err = client.wallet().await.unwrap_err();

        assert!(err.is_auth_failure());
        assert_eq!(transport.calls_to("/customer/wallet"), 0);
        assert_eq!(redirects.count(), 1);
    }

    // ---------------------------------------------------------------------------
    // Parking search
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_parking_locations_are_public() {
        let transport = ok(r#"[{"id":1,"name":"Downtown Plaza","price_per_hour_minor":500}]"#);
        let (client, _) = client_with(Arc::clone(&transport), None);

        let locations = client.parking_locations(Some("Old Town")).await.unwrap();

        assert_eq!(locations[0].hourly_rate_display(), "5.00 PLN/h");
        let request = &transport.requests()[0];
        assert!(request.bearer.is_none());
        assert_eq!(request.url, "http://parkflow.test/parking/locations?location=Old+Town");
    }

    #[tokio::test]
    async fn test_blank_location_lists_everything() {
        let transport = ok("[]");
        let (client, _) = client_with(Arc::clone(&transport), None);

        client.parking_locations(Some("  ")).await.unwrap();

        assert_eq!(transport.requests()[0].url, "http://parkflow.test/parking/locations");
    }

    #[tokio::test]
    async fn test_occupancy_falls_back_to_sample() {
        let transport = Arc::new(FakeTransport::new(|_| {
            Err(TransportError::Network("connection refused".into()))
        }));
        let (client, _) = client_with(transport, None);

        let occupancy = client.occupancy(&EntityId::from(1)).await;

        assert_eq!(occupancy, Occupancy::sample());
    }

    #[tokio::test]
    async fn test_reservation_fee() {
        let transport = ok(r#"{"reservationFeeMinor":"300"}"#);
        let (client, _) = client_with(Arc::clone(&transport), None);

        let fee = client.reservation_fee(&EntityId::from(5)).await.unwrap();

        assert_eq!(fee, MinorUnits(300));
        assert!(transport.requests()[0].url.ends_with("/parking/pricing/5/reservation-fee"));
    }
}
