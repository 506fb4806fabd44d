//! Lifecycle scenarios for the station controller.

#[cfg(test)]
mod tests {
    use crate::client::{MockResourceClient, ResourceClient};
    use crate::controller::{ControllerSettings, NotebookRunRequest, StationController};
    use crate::core::{
        NotebookContent, NotebookMetadata, NotebookRunState, ParameterMap, ResourceKind,
        RunHandle, StationInfo, StationRef, TeardownTarget, WorkspaceStatus, SETUP_SEQUENCE,
        TEARDOWN_SEQUENCE,
    };
    use crate::events::{names, CollectingEventSink};
    use crate::polling::PollPolicy;
    use crate::testing::{ClientCall, ScriptedResourceClient};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn station() -> StationRef {
        StationRef::new("room", "s1").unwrap()
    }

    fn fast_settings() -> ControllerSettings {
        let policy = PollPolicy::new()
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(20);
        ControllerSettings::new("alice@example.com")
            .with_workspace_poll(policy)
            .with_run_poll(policy)
    }

    fn request() -> NotebookRunRequest {
        let mut params = ParameterMap::new();
        params.insert("threshold".to_string(), "5".to_string());
        let mut tables = ParameterMap::new();
        tables.insert("results".to_string(), "shared_results".to_string());
        NotebookRunRequest::new("acme", "analysis")
            .with_parameters(params)
            .with_output_tables(tables)
    }

    fn controller(client: &Arc<ScriptedResourceClient>) -> StationController {
        let client: Arc<dyn ResourceClient> = client.clone();
        StationController::new(client, station(), fast_settings()).unwrap()
    }

    #[tokio::test]
    async fn test_happy_path_call_order() {
        let client = Arc::new(
            ScriptedResourceClient::new()
                .with_workspace_statuses(["PROVISIONING", "PROVISIONING", "RUNNING"])
                .with_run_states([
                    NotebookRunState::new("RUNNING"),
                    NotebookRunState::terminated("SUCCESS"),
                ])
                .with_object_id(1234),
        );

        let outcome = controller(&client)
            .prepare_and_run_notebook(&request())
            .await
            .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.notebook_url, "/#notebook/1234");
        assert_eq!(
            outcome.results_link_html(),
            "<a href='/#notebook/1234'>Notebook Results</a>"
        );
        assert!(outcome
            .notebook_path
            .starts_with("/Users/alice@example.com/clean_room_output_"));

        let expected = vec![
            ClientCall::CreateStation,
            ClientCall::SetupResource(ResourceKind::Metastore),
            ClientCall::SetupResource(ResourceKind::CollaboratorShares),
            ClientCall::SetupResource(ResourceKind::Workspace),
            ClientCall::GetWorkspaceStatus,
            ClientCall::GetWorkspaceStatus,
            ClientCall::GetWorkspaceStatus,
            ClientCall::SetupResource(ResourceKind::NotebookServicePrincipal),
            ClientCall::SetupResource(ResourceKind::Notebook),
            ClientCall::RunNotebook,
            ClientCall::GetRunState,
            ClientCall::GetRunState,
            ClientCall::ExportNotebookOutput,
            ClientCall::ImportNotebook,
            ClientCall::GetNotebookStatus,
        ];
        assert_eq!(client.calls(), expected);
    }

    #[tokio::test]
    async fn test_setup_requests_carry_tables_and_notebook() {
        let client = Arc::new(ScriptedResourceClient::new());
        controller(&client)
            .prepare_and_run_notebook(&request())
            .await
            .unwrap();

        let requests = client.setup_requests();
        let kinds: Vec<_> = requests.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, SETUP_SEQUENCE.to_vec());

        let shares = &requests[1];
        assert_eq!(
            shares.output_tables.as_ref().and_then(|t| t.get("results")).map(String::as_str),
            Some("shared_results")
        );
        let notebook = requests[4].notebook.as_ref().unwrap();
        assert_eq!(notebook.collaborator, "acme");
        assert_eq!(notebook.name, "analysis");

        assert_eq!(client.run_parameters()[0].get("threshold").unwrap(), "5");
    }

    #[tokio::test]
    async fn test_output_imported_verbatim() {
        let client = Arc::new(
            ScriptedResourceClient::new().with_export(NotebookContent::html("PGI+aGk8L2I+")),
        );
        let outcome = controller(&client)
            .prepare_and_run_notebook(&request())
            .await
            .unwrap();

        let imports = client.imports();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].0, outcome.notebook_path);
        assert_eq!(imports[0].1, NotebookContent::html("PGI+aGk8L2I+"));
    }

    #[tokio::test]
    async fn test_browser_host_makes_link_absolute() {
        let client = Arc::new(ScriptedResourceClient::new().with_object_id(77));
        let settings = fast_settings().with_browser_host("adb-9.example.net");
        let client_dyn: Arc<dyn ResourceClient> = client.clone();
        let outcome = StationController::new(client_dyn, station(), settings)
            .unwrap()
            .prepare_and_run_notebook(&request())
            .await
            .unwrap();

        assert_eq!(outcome.notebook_url, "https://adb-9.example.net/#notebook/77");
    }

    #[tokio::test]
    async fn test_failed_result_is_returned_not_raised() {
        let client = Arc::new(ScriptedResourceClient::new().with_run_states([
            NotebookRunState::terminated("FAILED").with_message("assertion failed"),
        ]));
        let outcome = controller(&client)
            .prepare_and_run_notebook(&request())
            .await
            .unwrap();

        assert!(!outcome.succeeded());
        assert_eq!(client.call_count(ClientCall::ImportNotebook), 1);
    }

    #[tokio::test]
    async fn test_workspace_failure_stops_before_notebook_setup() {
        let client = Arc::new(
            ScriptedResourceClient::new().with_workspace_statuses(["PROVISIONING", "FAILED"]),
        );
        let err = controller(&client)
            .prepare_and_run_notebook(&request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ProvisioningFailedError");
        assert!(err.to_string().contains("FAILED"));
        assert_eq!(client.call_count(ClientCall::GetWorkspaceStatus), 2);
        assert_eq!(
            client.call_count(ClientCall::SetupResource(ResourceKind::NotebookServicePrincipal)),
            0
        );
        assert_eq!(client.call_count(ClientCall::RunNotebook), 0);
    }

    #[tokio::test]
    async fn test_fatal_run_state_is_notebook_run_failed() {
        for lcs in ["SKIPPED", "INTERNAL_ERROR"] {
            let client = Arc::new(ScriptedResourceClient::new().with_run_states([
                NotebookRunState::new("PENDING"),
                NotebookRunState::new(lcs).with_message("cluster lost"),
            ]));
            let err = controller(&client)
                .prepare_and_run_notebook(&request())
                .await
                .unwrap_err();

            assert_eq!(err.kind(), "NotebookRunFailedError");
            assert!(err.to_string().contains(lcs));
            assert!(err.to_string().contains("cluster lost"));
            assert_eq!(client.call_count(ClientCall::GetRunState), 2);
            assert_eq!(client.call_count(ClientCall::ExportNotebookOutput), 0);
        }
    }

    #[tokio::test]
    async fn test_provisioning_timeout_is_distinct() {
        let client = Arc::new(ScriptedResourceClient::new().with_workspace_statuses(["PROVISIONING"]));
        let settings = fast_settings().with_workspace_poll(
            PollPolicy::new()
                .with_interval(Duration::from_millis(1))
                .with_max_attempts(3),
        );
        let client_dyn: Arc<dyn ResourceClient> = client.clone();
        let err = StationController::new(client_dyn, station(), settings)
            .unwrap()
            .prepare_and_run_notebook(&request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "TimeoutError");
        assert_eq!(client.call_count(ClientCall::GetWorkspaceStatus), 3);
    }

    #[tokio::test]
    async fn test_existing_station_fails_fast() {
        let client = Arc::new(ScriptedResourceClient::new().failing(
            ClientCall::CreateStation,
            409,
            "station exists",
        ));
        let err = controller(&client)
            .prepare_and_run_notebook(&request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "RemoteCallError");
        assert!(err.to_string().contains("station exists"));
        assert_eq!(client.calls(), vec![ClientCall::CreateStation]);
    }

    #[tokio::test]
    async fn test_setup_failure_leaves_earlier_resources() {
        let client = Arc::new(ScriptedResourceClient::new().failing(
            ClientCall::SetupResource(ResourceKind::Workspace),
            500,
            "quota exceeded",
        ));
        let err = controller(&client)
            .prepare_and_run_notebook(&request())
            .await
            .unwrap_err();

        assert_eq!(err.http_status(), Some(500));
        assert_eq!(
            client.calls(),
            vec![
                ClientCall::CreateStation,
                ClientCall::SetupResource(ResourceKind::Metastore),
                ClientCall::SetupResource(ResourceKind::CollaboratorShares),
                ClientCall::SetupResource(ResourceKind::Workspace),
            ]
        );
    }

    #[tokio::test]
    async fn test_teardown_order_and_events() {
        let client = Arc::new(ScriptedResourceClient::new());
        let sink = Arc::new(CollectingEventSink::new());
        let report = controller(&client)
            .with_event_sink(sink.clone())
            .teardown_station()
            .await;

        assert!(report.is_complete());
        let mut expected: Vec<_> = TEARDOWN_SEQUENCE
            .iter()
            .map(|k| ClientCall::TeardownResource(*k))
            .collect();
        expected.push(ClientCall::DeleteStation);
        assert_eq!(client.calls(), expected);

        assert_eq!(sink.events_of_type(names::RESOURCE_TEARDOWN).len(), 4);
        assert_eq!(sink.events_of_type(names::STATION_DELETED).len(), 1);
    }

    #[tokio::test]
    async fn test_teardown_attempts_every_step_after_failure() {
        let client = Arc::new(
            ScriptedResourceClient::new()
                .failing(
                    ClientCall::TeardownResource(ResourceKind::Workspace),
                    500,
                    "busy",
                )
                .failing(ClientCall::DeleteStation, 404, "gone"),
        );
        let report = controller(&client).teardown_station().await;

        assert!(!report.is_complete());
        assert_eq!(report.steps.len(), 5);
        let failed: Vec<_> = report.failures().iter().map(|s| s.target).collect();
        assert_eq!(
            failed,
            vec![
                TeardownTarget::Resource(ResourceKind::Workspace),
                TeardownTarget::Station
            ]
        );
        assert_eq!(client.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_prepare_emits_lifecycle_events() {
        let client = Arc::new(ScriptedResourceClient::new());
        let sink = Arc::new(CollectingEventSink::new());
        controller(&client)
            .with_event_sink(sink.clone())
            .prepare_and_run_notebook(&request())
            .await
            .unwrap();

        let types = sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some(names::STATION_CREATED));
        assert_eq!(types.last().map(String::as_str), Some(names::OUTPUT_IMPORTED));
        assert_eq!(sink.events_of_type(names::RESOURCE_SETUP).len(), 5);
    }

    #[tokio::test]
    async fn test_list_stations_uses_clean_room() {
        let client = Arc::new(ScriptedResourceClient::new().with_stations(vec![StationInfo {
            station_name: Some("s1".to_string()),
            ..StationInfo::default()
        }]));
        let stations = controller(&client).list_stations().await.unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(client.calls(), vec![ClientCall::ListStations]);
    }

    #[tokio::test]
    async fn test_blank_owner_is_rejected_before_any_call() {
        let client = Arc::new(ScriptedResourceClient::new());
        let client_dyn: Arc<dyn ResourceClient> = client.clone();
        let controller =
            StationController::new(client_dyn, station(), ControllerSettings::new(" ")).unwrap();

        let err = controller
            .prepare_and_run_notebook(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(client.calls().is_empty());

        assert!(controller.teardown_station().await.is_complete());
    }

    #[tokio::test]
    async fn test_mock_client_sees_strict_sequence() {
        let mut mock = MockResourceClient::new();
        let mut seq = Sequence::new();

        mock.expect_create_station()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StationInfo::default()));
        for kind in [
            ResourceKind::Metastore,
            ResourceKind::CollaboratorShares,
            ResourceKind::Workspace,
        ] {
            mock.expect_setup_resource()
                .withf(move |_, req| req.kind == kind)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(serde_json::json!({})));
        }
        mock.expect_get_workspace_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(WorkspaceStatus::Running));
        for kind in [ResourceKind::NotebookServicePrincipal, ResourceKind::Notebook] {
            mock.expect_setup_resource()
                .withf(move |_, req| req.kind == kind)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(serde_json::json!({})));
        }
        mock.expect_run_notebook()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(RunHandle::default()));
        mock.expect_get_run_state()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(NotebookRunState::terminated("SUCCESS")));
        mock.expect_export_notebook_output()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(NotebookContent::html("eA==")));
        mock.expect_import_notebook()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_get_notebook_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|path| {
                Ok(NotebookMetadata {
                    object_id: 5,
                    path: Some(path.to_string()),
                    ..NotebookMetadata::default()
                })
            });

        let client: Arc<dyn ResourceClient> = Arc::new(mock);
        let outcome = StationController::new(client, station(), fast_settings())
            .unwrap()
            .prepare_and_run_notebook(&request())
            .await
            .unwrap();
        assert_eq!(outcome.notebook_url, "/#notebook/5");
    }
}
