//! OpenWeatherMap current-weather tool.
//!
//! Looks up the current conditions for a city and normalizes the vendor's
//! payload into a [`WeatherReport`] with explicit unit symbols.

use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, json};
use tracing::info;

use crate::core::config::Config;
use crate::domains::tools::error::{ErrorCode, StructuredError};
use crate::domains::tools::handlers::{
    Arguments, HandlerResult, ToolHandler, ToolOutput, optional_str, require_api_key, required_str,
};
use crate::domains::tools::registry::ToolDescriptor;
use crate::domains::tools::upstream::{UpstreamCall, UpstreamClient};

const API_NAME: &str = "OpenWeatherMap";
const CALL: UpstreamCall<'static> = UpstreamCall {
    api: API_NAME,
    operation: "get_weather",
};

// ============================================================================
// Units
// ============================================================================

/// Unit system requested from the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
    Kelvin,
}

impl Units {
    pub const ALLOWED: [&'static str; 3] = ["metric", "imperial", "kelvin"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            "kelvin" => Some(Units::Kelvin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Kelvin => "kelvin",
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Kelvin => "K",
        }
    }

    pub fn speed_symbol(self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Kelvin => "m/s",
        }
    }
}

// ============================================================================
// Structured Output
// ============================================================================

/// Normalized current weather.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct WeatherReport {
    pub location: Location,
    pub weather: Conditions,
    pub temperature: Temperature,
    pub humidity: String,
    pub pressure: String,
    pub visibility: String,
    pub wind: Wind,
    pub clouds: String,
    pub timestamp: i64,
    pub timezone: i64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Coordinates {
    pub latitude: Number,
    pub longitude: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Conditions {
    pub condition: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Temperature {
    pub current: Number,
    pub feels_like: Number,
    pub min: Number,
    pub max: Number,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Wind {
    pub speed: String,
    pub direction: String,
}

impl WeatherReport {
    /// Readable rendering shown to MCP clients.
    pub fn summary(&self) -> String {
        let unit = &self.temperature.unit;
        let location = if self.location.country.is_empty() {
            self.location.city.clone()
        } else {
            format!("{}, {}", self.location.city, self.location.country)
        };

        let mut output = format!("Weather for {location}\n\n");
        output.push_str(&format!(
            "Condition: {}\n",
            title_case(&self.weather.description)
        ));
        output.push_str(&format!(
            "Temperature: {}{unit} (feels like {}{unit})\n",
            self.temperature.current, self.temperature.feels_like
        ));
        output.push_str(&format!("Humidity: {}\n", self.humidity));
        output.push_str(&format!(
            "Wind: {} from {}\n",
            self.wind.speed, self.wind.direction
        ));
        output.push_str(&format!("Pressure: {}\n", self.pressure));
        output.push_str(&format!("Cloudiness: {}\n", self.clouds));
        output.push_str(&format!("\nData from {}", self.source));
        output
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Upstream payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawWeather {
    name: String,
    sys: RawSys,
    coord: RawCoord,
    weather: Vec<RawCondition>,
    main: RawMain,
    #[serde(default)]
    visibility: Option<f64>,
    wind: RawWind,
    clouds: RawClouds,
    dt: i64,
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct RawSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct RawCoord {
    lat: Number,
    lon: Number,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: Number,
    feels_like: Number,
    temp_min: Number,
    temp_max: Number,
    humidity: Number,
    pressure: Number,
}

#[derive(Debug, Deserialize)]
struct RawWind {
    speed: Number,
    #[serde(default)]
    deg: Option<Number>,
}

#[derive(Debug, Deserialize)]
struct RawClouds {
    all: Number,
}

fn normalize(raw: RawWeather, units: Units) -> Result<WeatherReport, StructuredError> {
    let condition = raw.weather.into_iter().next().ok_or_else(|| {
        StructuredError::upstream_failure(
            API_NAME,
            CALL.operation,
            "response has no weather conditions",
        )
    })?;
    let direction = raw.wind.deg.unwrap_or_else(|| Number::from(0));

    Ok(WeatherReport {
        location: Location {
            city: raw.name,
            country: raw.sys.country,
            coordinates: Coordinates {
                latitude: raw.coord.lat,
                longitude: raw.coord.lon,
            },
        },
        weather: Conditions {
            condition: condition.main,
            description: condition.description,
            icon: condition.icon,
        },
        temperature: Temperature {
            current: raw.main.temp,
            feels_like: raw.main.feels_like,
            min: raw.main.temp_min,
            max: raw.main.temp_max,
            unit: units.temperature_symbol().to_string(),
        },
        humidity: format!("{}%", raw.main.humidity),
        pressure: format!("{} hPa", raw.main.pressure),
        visibility: format!("{:.1} km", raw.visibility.unwrap_or(0.0) / 1000.0),
        wind: Wind {
            speed: format!("{} {}", raw.wind.speed, units.speed_symbol()),
            direction: format!("{direction}°"),
        },
        clouds: format!("{}%", raw.clouds.all),
        timestamp: raw.dt,
        timezone: raw.timezone,
        source: API_NAME.to_string(),
    })
}

// ============================================================================
// Tool Implementation
// ============================================================================

/// `get_weather` tool.
#[derive(Debug, Clone)]
pub struct GetWeatherTool {
    api_key: Option<String>,
    base_url: String,
    upstream: UpstreamClient,
}

impl GetWeatherTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_weather";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get current weather information for a specified city";

    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        upstream: UpstreamClient,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            upstream,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.credentials.openweather_api_key.clone(),
            config.upstream.weather_base_url.clone(),
            config.upstream.client(),
        )
    }

    pub fn input_schema() -> JsonObject {
        let schema = json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "Name of the city",
                    "minLength": 1,
                },
                "country": {
                    "type": "string",
                    "description": "Country code (optional, e.g., 'US', 'GB')",
                    "pattern": "^[A-Z]{2}$",
                },
                "units": {
                    "type": "string",
                    "description": "Temperature units",
                    "enum": Units::ALLOWED,
                    "default": "metric",
                },
            },
            "required": ["city"],
            "additionalProperties": false,
        });
        match schema {
            serde_json::Value::Object(map) => map,
            _ => JsonObject::new(),
        }
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, Self::input_schema())
            .with_output_schema(cached_schema_for_type::<WeatherReport>().as_ref().clone())
    }

    /// Fetch and normalize the current weather.
    pub async fn fetch(&self, args: &Arguments) -> Result<WeatherReport, StructuredError> {
        let api_key = require_api_key(self.api_key.as_deref(), API_NAME)?;

        let city = required_str(
            args,
            "city",
            "City parameter is required",
            "City name cannot be empty",
        )?;
        let country = optional_str(args, "country")?
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let units_raw = optional_str(args, "units")?.unwrap_or("metric");
        let units = Units::parse(units_raw).ok_or_else(|| {
            StructuredError::invalid_param(
                "units",
                units_raw,
                "Units must be one of: metric, imperial, kelvin",
            )
        })?;

        let location = match country {
            Some(country) => format!("{city},{country}"),
            None => city.to_string(),
        };
        info!(location = %location, units = units.as_str(), "Processing weather request");

        let url = format!("{}/weather", self.base_url.trim_end_matches('/'));
        let query = [
            ("q", location.clone()),
            ("appid", api_key.to_string()),
            ("units", units.as_str().to_string()),
        ];
        let response = self.upstream.get(CALL, &url, &query).await?;

        if response.is_success() {
            let raw: RawWeather = response.json(CALL)?;
            let report = normalize(raw, units)?;
            info!(location = %location, "Weather request completed");
            return Ok(report);
        }
        if response.status == 404 {
            return Err(StructuredError::new(
                ErrorCode::InvalidParams,
                format!("City '{location}' not found"),
            )
            .with_data("city", location));
        }
        Err(response.status_error(CALL))
    }
}

#[async_trait::async_trait]
impl ToolHandler for GetWeatherTool {
    async fn call(&self, arguments: Arguments) -> HandlerResult {
        Ok(ToolOutput::Weather(self.fetch(&arguments).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::Value;

    fn london() -> Value {
        json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [
                { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }
            ],
            "main": {
                "temp": 14.2, "feels_like": 13.6, "temp_min": 12.9, "temp_max": 15.3,
                "pressure": 1012, "humidity": 76
            },
            "visibility": 10000,
            "wind": { "speed": 4.12, "deg": 240 },
            "clouds": { "all": 75 },
            "dt": 1717161600,
            "sys": { "country": "GB" },
            "timezone": 3600,
            "name": "London"
        })
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn tool(server: &MockServer, key: Option<&str>) -> GetWeatherTool {
        GetWeatherTool::new(key.map(String::from), server.base_url(), UpstreamClient::default())
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = tool(&server, None)
            .fetch(&args(json!({ "city": "Paris" })))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ApiKeyMissing);
        assert_eq!(err.data_value("api"), Some(&json!("OpenWeatherMap")));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_blank_city_fails_before_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": "   " })))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidParams);
        assert_eq!(err.data_value("field"), Some(&json!("city")));
        assert_eq!(err.data_value("value"), Some(&json!("   ")));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_invalid_units_fails_before_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": "Paris", "units": "rankine" })))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidParams);
        assert_eq!(err.data_value("field"), Some(&json!("units")));
        assert_eq!(err.data_value("value"), Some(&json!("rankine")));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_normalizes_weather_payload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/weather")
                    .query_param("q", "London,GB")
                    .query_param("appid", "key")
                    .query_param("units", "imperial");
                then.status(200).json_body(london());
            })
            .await;

        let report = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": " London ", "country": "GB", "units": "imperial" })))
            .await
            .unwrap();

        mock.assert_async().await;
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["location"]["city"], "London");
        assert_eq!(value["location"]["coordinates"]["latitude"], 51.5085);
        assert_eq!(value["weather"]["condition"], "Clouds");
        assert_eq!(value["temperature"]["current"], 14.2);
        assert_eq!(value["temperature"]["unit"], "°F");
        assert_eq!(value["humidity"], "76%");
        assert_eq!(value["pressure"], "1012 hPa");
        assert_eq!(value["visibility"], "10.0 km");
        assert_eq!(value["wind"]["speed"], "4.12 mph");
        assert_eq!(value["wind"]["direction"], "240°");
        assert_eq!(value["clouds"], "75%");
        assert_eq!(value["timestamp"], 1717161600);
        assert_eq!(value["source"], "OpenWeatherMap");
    }

    #[tokio::test]
    async fn test_optional_upstream_fields_default() {
        let server = MockServer::start_async().await;
        let mut body = london();
        body.as_object_mut().unwrap().remove("visibility");
        body["wind"].as_object_mut().unwrap().remove("deg");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/weather");
                then.status(200).json_body(body);
            })
            .await;

        let report = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": "London" })))
            .await
            .unwrap();

        assert_eq!(report.visibility, "0.0 km");
        assert_eq!(report.wind.direction, "0°");
        assert_eq!(report.wind.speed, "4.12 m/s");
        assert_eq!(report.temperature.unit, "°C");
    }

    #[tokio::test]
    async fn test_missing_mandatory_field_is_external_error() {
        let server = MockServer::start_async().await;
        let mut body = london();
        body.as_object_mut().unwrap().remove("main");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/weather");
                then.status(200).json_body(body);
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": "London" })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalApiError);
        assert_eq!(err.data_value("operation"), Some(&json!("get_weather")));
    }

    #[tokio::test]
    async fn test_any_2xx_status_is_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/weather");
                then.status(203).json_body(london());
            })
            .await;

        let report = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": "London" })))
            .await
            .unwrap();
        assert_eq!(report.location.city, "London");
    }

    #[tokio::test]
    async fn test_upstream_status_mapping() {
        for (status, expected) in [
            (401, ErrorCode::ApiKeyInvalid),
            (404, ErrorCode::InvalidParams),
            (429, ErrorCode::RateLimitExceeded),
            (500, ErrorCode::ExternalApiError),
        ] {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/weather");
                    then.status(status).body(r#"{"cod":"err","message":"nope"}"#);
                })
                .await;

            let err = tool(&server, Some("key"))
                .fetch(&args(json!({ "city": "Atlantis" })))
                .await
                .unwrap_err();
            assert_eq!(err.code, expected, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_not_found_names_the_location() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/weather");
                then.status(404);
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": "Atlantis" })))
            .await
            .unwrap_err();
        assert_eq!(err.message, "City 'Atlantis' not found");
        assert_eq!(err.data_value("city"), Some(&json!("Atlantis")));
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/weather");
                then.status(200).json_body(london());
            })
            .await;

        let weather = tool(&server, Some("key"));
        let arguments = args(json!({ "city": "Paris", "units": "metric" }));
        let first = weather.call(arguments.clone()).await.unwrap();
        let second = weather.call(arguments).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_summary_reads_like_a_report() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/weather");
                then.status(200).json_body(london());
            })
            .await;

        let report = tool(&server, Some("key"))
            .fetch(&args(json!({ "city": "London" })))
            .await
            .unwrap();
        let summary = report.summary();

        assert!(summary.starts_with("Weather for London, GB\n"));
        assert!(summary.contains("Condition: Broken Clouds\n"));
        assert!(summary.contains("Temperature: 14.2°C (feels like 13.6°C)\n"));
        assert!(summary.contains("Humidity: 76%\n"));
        assert!(summary.contains("Wind: 4.12 m/s from 240°\n"));
        assert!(summary.ends_with("Data from OpenWeatherMap"));
    }

    #[test]
    fn test_descriptor_schema() {
        let descriptor = GetWeatherTool::descriptor();
        assert_eq!(descriptor.name, "get_weather");
        assert_eq!(descriptor.input_schema["required"], json!(["city"]));
        assert_eq!(
            descriptor.input_schema["properties"]["units"]["enum"],
            json!(["metric", "imperial", "kelvin"])
        );
        assert!(descriptor.output_schema.is_some());
    }
}
