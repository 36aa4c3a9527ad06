//! # Interactive Session
//!
//! The session object owns the bus connection for the lifetime of the
//! console: constructed after `connect()`, released exactly once on every
//! exit path. Menu selections map to either a non-blocking handler
//! registration, a one-shot query, or the cancellable live-monitor wait.

use fabric_bus::topics::{
    endpoint_mgmt_activity_topic, TOPIC_CERT_REP_CHANGE, TOPIC_DETONATION_REPORT,
    TOPIC_FILE_FIRST_INSTANCE, TOPIC_FILE_REP_CHANGE,
};
use fabric_bus::BusGateway;
use fabric_events::{OutputSink, ReputationChangeHandler, TelemetryHandler};
use fabric_query::{PagedQueryClient, ResultHandle, TextQueryClient};
use fabric_types::{
    ConditionTree, ConnectionError, QueryError, ResultPage, SortDirection, UnknownSelection,
};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

/// The seven menu selections, defined once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    /// 1: Monitor and present reputation changes (blocking until interrupt).
    MonitorReputationChanges,
    /// 2: Monitor first-instance events.
    MonitorFirstInstance,
    /// 3: Monitor detonation file reports.
    MonitorDetonationReports,
    /// 4: Monitor endpoint-management remote service activity.
    MonitorMgmtActivity,
    /// 5: Paged host-process search by IP address.
    HostProcessSearch,
    /// 6: Free-text endpoint-management search.
    TextSearch,
    /// 7: Exit.
    Exit,
}

impl MenuOption {
    /// All options in menu order.
    pub const ALL: [Self; 7] = [
        Self::MonitorReputationChanges,
        Self::MonitorFirstInstance,
        Self::MonitorDetonationReports,
        Self::MonitorMgmtActivity,
        Self::HostProcessSearch,
        Self::TextSearch,
        Self::Exit,
    ];

    /// Menu label shown to the operator.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::MonitorReputationChanges => "Monitor and Present Reputation Changes",
            Self::MonitorFirstInstance => "Monitor First Instance Events",
            Self::MonitorDetonationReports => "Monitor Detonation File Reports",
            Self::MonitorMgmtActivity => "Monitor Endpoint Management Activity",
            Self::HostProcessSearch => "Query host processes by IP address",
            Self::TextSearch => "Query endpoint management for text",
            Self::Exit => "Exit",
        }
    }

    /// Menu digit for this option.
    #[must_use]
    pub fn key(&self) -> char {
        match self {
            Self::MonitorReputationChanges => '1',
            Self::MonitorFirstInstance => '2',
            Self::MonitorDetonationReports => '3',
            Self::MonitorMgmtActivity => '4',
            Self::HostProcessSearch => '5',
            Self::TextSearch => '6',
            Self::Exit => '7',
        }
    }
}

impl TryFrom<&str> for MenuOption {
    type Error = UnknownSelection;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        match input.trim() {
            "1" => Ok(Self::MonitorReputationChanges),
            "2" => Ok(Self::MonitorFirstInstance),
            "3" => Ok(Self::MonitorDetonationReports),
            "4" => Ok(Self::MonitorMgmtActivity),
            "5" => Ok(Self::HostProcessSearch),
            "6" => Ok(Self::TextSearch),
            "7" => Ok(Self::Exit),
            other => Err(UnknownSelection(other.to_string())),
        }
    }
}

/// Session controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Showing the menu.
    MenuDisplay,
    /// Waiting for a selection.
    AwaitingSelection,
    /// Live monitor registered, foreground waiting for interrupt.
    RunningBlockingSubscription,
    /// A one-shot query is in flight.
    RunningOneShotQuery,
    /// Connection released, loop ends.
    Exiting,
}

impl SessionState {
    /// The state a selection transitions `AwaitingSelection` into.
    #[must_use]
    pub fn on_selection(option: MenuOption) -> Self {
        match option {
            MenuOption::MonitorReputationChanges => Self::RunningBlockingSubscription,
            MenuOption::MonitorFirstInstance
            | MenuOption::MonitorDetonationReports
            | MenuOption::MonitorMgmtActivity => Self::MenuDisplay,
            MenuOption::HostProcessSearch | MenuOption::TextSearch => Self::RunningOneShotQuery,
            MenuOption::Exit => Self::Exiting,
        }
    }
}

/// The session: owns the gateway handle and the query clients.
pub struct Session {
    gateway: Arc<dyn BusGateway>,
    paged: PagedQueryClient,
    text: TextQueryClient,
    sink: OutputSink,
    instance_id: String,
    page_size: usize,
}

impl Session {
    /// Build a session over a gateway. Call `connect` before dispatching.
    pub fn new(
        gateway: Arc<dyn BusGateway>,
        instance_id: impl Into<String>,
        page_size: usize,
        sink: OutputSink,
    ) -> Self {
        let instance_id = instance_id.into();
        Self {
            paged: PagedQueryClient::new(gateway.clone()),
            text: TextQueryClient::new(gateway.clone(), instance_id.clone()),
            gateway,
            sink,
            instance_id,
            page_size,
        }
    }

    /// Connect to the fabric. Fatal on failure: there is no session without
    /// a connection.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        self.gateway.connect().await
    }

    /// Release the connection. Safe on every exit path: the gateway makes
    /// repeated calls no-ops.
    pub async fn shutdown(&self) {
        self.gateway.disconnect().await;
        info!("Session closed");
    }

    /// Page size used for host-process searches.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Selection 1: register reputation-change handlers for both the file
    /// and certificate topics. The caller then parks the foreground in a
    /// cancellable wait.
    pub fn subscribe_reputation_changes(&self) -> Result<(), ConnectionError> {
        let handler = Arc::new(ReputationChangeHandler::new(self.sink.clone()));
        self.gateway
            .subscribe_event(TOPIC_FILE_REP_CHANGE, handler.clone())?;
        self.gateway
            .subscribe_event(TOPIC_CERT_REP_CHANGE, handler)?;
        info!("Reputation-change monitor registered");
        Ok(())
    }

    /// Selections 2-4: register a telemetry handler on one fixed topic and
    /// return to the menu. The handler fires on the fabric's delivery task
    /// from here on.
    pub fn subscribe_telemetry(&self, option: MenuOption) -> Result<(), ConnectionError> {
        let topic = match option {
            MenuOption::MonitorFirstInstance => TOPIC_FILE_FIRST_INSTANCE.to_string(),
            MenuOption::MonitorDetonationReports => TOPIC_DETONATION_REPORT.to_string(),
            MenuOption::MonitorMgmtActivity => {
                endpoint_mgmt_activity_topic(&self.instance_id)
            }
            _ => return Ok(()),
        };
        info!(topic = %topic, "Adding telemetry handler");
        self.gateway
            .subscribe_event(&topic, Arc::new(TelemetryHandler::new(self.sink.clone())))
    }

    /// Selection 5: create a host-process search for one IP address.
    ///
    /// The caller pulls pages from the handle (Enter-gated in the console).
    pub async fn host_search(&self, ip_address: &str) -> Result<ResultHandle, QueryError> {
        let conditions = ConditionTree::single_equals("HostInfo", "ip_address", ip_address);
        self.paged.search(&["Processes"], &conditions).await
    }

    /// Fetch one page of a host-process search, sorted by process name.
    pub async fn host_search_page(
        &self,
        handle: &ResultHandle,
        offset: usize,
    ) -> Result<ResultPage, QueryError> {
        handle
            .get_page(offset, self.page_size, "Processes|name", SortDirection::Asc)
            .await
    }

    /// Selection 6: free-text find, rendered for display.
    pub async fn find_text(&self, text: &str) -> Result<String, QueryError> {
        let document = self.text.text_search(text).await?;
        TextQueryClient::render_pretty(&document)
    }

    /// Render one result page: page banner plus the process name of every
    /// item.
    #[must_use]
    pub fn render_page(page: &ResultPage) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Page: {}", page.page_number());
        for item in &page.items {
            let name = item
                .get("output")
                .and_then(|o| o.get("Processes|name"))
                .and_then(|n| n.as_str())
                .unwrap_or("<unnamed>");
            let _ = writeln!(out, "    {name}");
        }
        out
    }

    /// The menu text shown between operations.
    #[must_use]
    pub fn menu_text() -> String {
        let mut out = String::new();
        let _ = writeln!(out, "==== Fabric Monitor & Search Tool ====");
        for option in MenuOption::ALL {
            let _ = writeln!(out, "{} {}", option.key(), option.label());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_parsing() {
        assert_eq!(MenuOption::try_from("5"), Ok(MenuOption::HostProcessSearch));
        assert_eq!(MenuOption::try_from(" 7 "), Ok(MenuOption::Exit));
        assert_eq!(
            MenuOption::try_from("9"),
            Err(UnknownSelection("9".to_string()))
        );
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(
            SessionState::on_selection(MenuOption::MonitorReputationChanges),
            SessionState::RunningBlockingSubscription
        );
        assert_eq!(
            SessionState::on_selection(MenuOption::MonitorFirstInstance),
            SessionState::MenuDisplay
        );
        assert_eq!(
            SessionState::on_selection(MenuOption::HostProcessSearch),
            SessionState::RunningOneShotQuery
        );
        assert_eq!(
            SessionState::on_selection(MenuOption::Exit),
            SessionState::Exiting
        );
    }

    #[test]
    fn test_menu_text_lists_all_options() {
        let text = Session::menu_text();
        for option in MenuOption::ALL {
            assert!(text.contains(option.label()));
        }
    }

    #[test]
    fn test_render_page() {
        let page = ResultPage {
            offset: 20,
            page_size: 20,
            total: 45,
            items: vec![
                serde_json::json!({ "output": { "Processes|name": "sshd" } }),
                serde_json::json!({ "output": {} }),
            ],
        };
        let rendered = Session::render_page(&page);
        assert!(rendered.starts_with("Page: 2\n"));
        assert!(rendered.contains("    sshd"));
        assert!(rendered.contains("    <unnamed>"));
    }
}
