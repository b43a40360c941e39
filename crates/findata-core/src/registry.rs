//! The fixed table of tools exposed to the assistant.
//!
//! Every tool shares one pipeline and differs only in its parameter list,
//! upstream path and response shape, so adding a tool means adding one entry
//! to [`TOOLS`].

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::schema::{DefaultValue, ParamSpec, ParamType};
use crate::ToolError;

/// Identifier of a registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    GetIncomeStatements,
    GetBalanceSheets,
    GetCashFlowStatements,
    GetCurrentPrice,
    GetPrices,
    GetNews,
}

impl ToolId {
    pub const ALL: [Self; 6] = [
        Self::GetIncomeStatements,
        Self::GetBalanceSheets,
        Self::GetCashFlowStatements,
        Self::GetCurrentPrice,
        Self::GetPrices,
        Self::GetNews,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetIncomeStatements => "get_income_statements",
            Self::GetBalanceSheets => "get_balance_sheets",
            Self::GetCashFlowStatements => "get_cash_flow_statements",
            Self::GetCurrentPrice => "get_current_price",
            Self::GetPrices => "get_prices",
            Self::GetNews => "get_news",
        }
    }
}

impl Display for ToolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == value)
            .ok_or_else(|| ToolError::unknown_tool(value))
    }
}

/// How the upstream payload of a tool is reshaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// An array of objects under the response key.
    Collection,
    /// A single price object under the response key.
    Snapshot,
    /// OHLCV records under the response key, re-ordered by date.
    PriceSeries,
}

/// Immutable description of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDefinition {
    pub id: ToolId,
    pub description: &'static str,
    pub path: &'static str,
    pub response_key: &'static str,
    pub shape: ResponseShape,
    pub params: &'static [ParamSpec],
}

impl ToolDefinition {
    pub const fn name(&self) -> &'static str {
        self.id.as_str()
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    /// JSON Schema describing the accepted arguments.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|spec| (spec.name.to_owned(), spec.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Tool listing entry in the shape assistant protocols expect.
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

const TICKER: ParamSpec = ParamSpec::required(
    "ticker",
    ParamType::Ticker,
    "Ticker symbol of the company (e.g. AAPL, GOOGL); \
     case-insensitive, surrounding whitespace is trimmed",
);

const PERIOD: ParamSpec = ParamSpec::optional(
    "period",
    ParamType::Period,
    "Reporting period: annual, quarterly or ttm",
)
.with_default(DefaultValue::Text("annual"));

const STATEMENT_LIMIT: ParamSpec = ParamSpec::optional(
    "limit",
    ParamType::PositiveInt,
    "Maximum number of statements to return",
)
.with_default(DefaultValue::Integer(4));

const STATEMENT_PARAMS: [ParamSpec; 3] = [TICKER, PERIOD, STATEMENT_LIMIT];

const PRICE_PARAMS: [ParamSpec; 5] = [
    TICKER,
    ParamSpec::optional(
        "interval",
        ParamType::Interval,
        "Interval of the price data: minute, day, week, month or year",
    )
    .with_default(DefaultValue::Text("day")),
    ParamSpec::optional(
        "interval_multiplier",
        ParamType::PositiveInt,
        "Multiplier of the interval (e.g. 5 with minute for 5-minute bars)",
    )
    .with_default(DefaultValue::Integer(1)),
    ParamSpec::required(
        "start_date",
        ParamType::Date,
        "Start date of the price data (e.g. 2020-01-01)",
    ),
    ParamSpec::required(
        "end_date",
        ParamType::Date,
        "End date of the price data (e.g. 2020-12-31)",
    ),
];

const NEWS_PARAMS: [ParamSpec; 4] = [
    TICKER,
    ParamSpec::optional(
        "limit",
        ParamType::PositiveInt,
        "Maximum number of articles to return",
    )
    .with_default(DefaultValue::Integer(10)),
    ParamSpec::optional(
        "start_date",
        ParamType::Date,
        "Only return articles published on or after this date",
    ),
    ParamSpec::optional(
        "end_date",
        ParamType::Date,
        "Only return articles published on or before this date",
    ),
];

/// All registered tools, in listing order.
pub static TOOLS: [ToolDefinition; 6] = [
    ToolDefinition {
        id: ToolId::GetIncomeStatements,
        description: "Get income statements for a company.",
        path: "/financials/income-statements/",
        response_key: "income_statements",
        shape: ResponseShape::Collection,
        params: &STATEMENT_PARAMS,
    },
    ToolDefinition {
        id: ToolId::GetBalanceSheets,
        description: "Get balance sheets for a company.",
        path: "/financials/balance-sheets/",
        response_key: "balance_sheets",
        shape: ResponseShape::Collection,
        params: &STATEMENT_PARAMS,
    },
    ToolDefinition {
        id: ToolId::GetCashFlowStatements,
        description: "Get cash flow statements for a company.",
        path: "/financials/cash-flow-statements/",
        response_key: "cash_flow_statements",
        shape: ResponseShape::Collection,
        params: &STATEMENT_PARAMS,
    },
    ToolDefinition {
        id: ToolId::GetCurrentPrice,
        description: "Get the current / latest price of a company.",
        path: "/prices/snapshot/",
        response_key: "snapshot",
        shape: ResponseShape::Snapshot,
        params: &[TICKER],
    },
    ToolDefinition {
        id: ToolId::GetPrices,
        description: "Get historical stock prices for a company.",
        path: "/prices/",
        response_key: "prices",
        shape: ResponseShape::PriceSeries,
        params: &PRICE_PARAMS,
    },
    ToolDefinition {
        id: ToolId::GetNews,
        description: "Get recent news articles about a company.",
        path: "/news/",
        response_key: "news",
        shape: ResponseShape::Collection,
        params: &NEWS_PARAMS,
    },
];

pub fn tool_definition(id: ToolId) -> &'static ToolDefinition {
    // TOOLS is declared in ToolId::ALL order.
    &TOOLS[id as usize]
}

/// Resolve a tool by its wire name.
pub fn resolve(name: &str) -> Result<&'static ToolDefinition, ToolError> {
    name.parse::<ToolId>().map(tool_definition)
}
