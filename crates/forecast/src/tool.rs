//! The `get-forecast` MCP tool.

use chrono::Local;
use mcp::{CallToolResult, Tool, ToolError, ToolHost};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::fetcher::ForecastFetcher;
use crate::format::format_forecast;
use crate::model::Coordinate;

pub const TOOL_NAME: &str = "get-forecast";

const TOOL_DESCRIPTION: &str = "获取天气预报";

#[derive(Debug, Deserialize)]
struct ForecastArgs {
    longitude: f64,
    latitude: f64,
}

/// Tool host exposing the forecast fetcher as `get-forecast`.
#[derive(Debug)]
pub struct ForecastTool {
    fetcher: ForecastFetcher,
    tools: Vec<Tool>,
}

impl ForecastTool {
    pub fn new(fetcher: ForecastFetcher) -> Self {
        Self {
            fetcher,
            tools: vec![Tool {
                name: TOOL_NAME.to_string(),
                description: Some(TOOL_DESCRIPTION.to_string()),
                input_schema: input_schema(),
            }],
        }
    }
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "longitude": {
                "type": "number",
                "minimum": -180,
                "maximum": 180,
                "description": "The longitude of the location"
            },
            "latitude": {
                "type": "number",
                "minimum": -90,
                "maximum": 90,
                "description": "The latitude of the location"
            }
        },
        "required": ["longitude", "latitude"],
        "additionalProperties": false
    })
}

/// Deserialize and range-check tool arguments before anything touches the network.
fn parse_coordinate(arguments: Value) -> Result<Coordinate, ToolError> {
    let args: ForecastArgs =
        serde_json::from_value(arguments).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    Coordinate::new(args.longitude, args.latitude)
        .map_err(|e| ToolError::InvalidInput(e.to_string()))
}

impl ToolHost for ForecastTool {
    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        if name != TOOL_NAME {
            return Err(ToolError::NotFound(name.to_string()));
        }

        let coordinate = parse_coordinate(arguments)?;
        let outcome = self.fetcher.fetch(&coordinate).await;
        info!(
            location = %coordinate.location_query(),
            unavailable = outcome.is_unavailable(),
            "forecast tool call finished"
        );

        let text = format_forecast(&outcome, &coordinate, &Local::now());
        Ok(CallToolResult::text(text))
    }
}
