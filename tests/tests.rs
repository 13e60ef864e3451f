#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use event_analyzer::{
        analize::{
            bonus::{analyze_bonus, BonusAnalyzer},
            orphans::{find_orphan_events, OrphanDetector},
            sender_map::{map_sender_activity, SenderMapper},
            time_delta::{calculate_time_deltas, TimeDeltaCalculator},
        },
        error::AnalyzerError,
        loader::{load_contract_events, parse_timestamp},
        models::{Column, EventRecord, EventTable, IssueType},
    };
    use std::collections::HashSet;
    use std::fs;
    use tempfile::{tempdir, NamedTempFile};

    const HEADER: &str = "event_id,previous_event_id,tx_hash,event_type,contract_address,sender,status,block_number,block_timestamp,gas_used,tx_index,node_region";

    fn base_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn make_event(
        id: &str,
        previous: Option<&str>,
        contract: &str,
        sender: &str,
        block: i64,
        offset_secs: i64,
    ) -> EventRecord {
        EventRecord {
            event_id: Some(id.to_string()),
            previous_event_id: previous.map(str::to_string),
            tx_hash: Some(format!("0x{}", id)),
            event_type: Some("Transfer".to_string()),
            contract_address: Some(contract.to_string()),
            sender: Some(sender.to_string()),
            status: Some("Confirmed".to_string()),
            block_number: Some(block),
            block_timestamp: Some(base_time() + Duration::seconds(offset_secs)),
            gas_used: Some(21000),
            tx_index: Some(0),
            node_region: Some("eu-west".to_string()),
        }
    }

    fn sender_events(sender: &str, count: usize, gap_secs: i64) -> Vec<EventRecord> {
        (0..count)
            .map(|i| {
                make_event(
                    &format!("{}-{}", sender, i),
                    None,
                    "0xcontract",
                    sender,
                    1,
                    i as i64 * gap_secs,
                )
            })
            .collect()
    }

    // loader

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_contract_events(dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, AnalyzerError::FileNotFound(_)));
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let err = load_contract_events(file.path()).unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyData(_)));
    }

    #[test]
    fn test_load_header_only_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), format!("{}\n", HEADER)).unwrap();
        let err = load_contract_events(file.path()).unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyData(_)));
    }

    #[test]
    fn test_load_typed_columns() {
        let file = NamedTempFile::new().unwrap();
        let content = "\
 event_id , previous_event_id,tx_hash,event_type,contract_address,sender,status,block_number,block_timestamp,gas_used,tx_index,node_region,extra
e1,,0xa,Transfer,0xc1,0xs1,Confirmed,100,2024-01-01 00:00:00,21000,0,eu,x
e2,e1,0xb,Approval,0xc1,0xs2,Reorged,,2024-01-01T00:00:05Z,,1,us,y
";
        fs::write(file.path(), content).unwrap();

        let table = load_contract_events(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns.len(), 12);
        assert_eq!(table.columns[0], Column::EventId);

        let first = &table.records[0];
        assert_eq!(first.event_id.as_deref(), Some("e1"));
        assert_eq!(first.previous_event_id, None);
        assert_eq!(first.block_number, Some(100));
        assert_eq!(first.gas_used, Some(21000));

        let second = &table.records[1];
        assert_eq!(second.previous_event_id.as_deref(), Some("e1"));
        assert_eq!(second.block_number, None);
        assert_eq!(second.gas_used, None);
        assert_eq!(second.tx_index, Some(1));
        assert_eq!(
            second.block_timestamp.unwrap() - first.block_timestamp.unwrap(),
            Duration::seconds(5)
        );
    }

    #[test]
    fn test_load_malformed_integer() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            format!("{}\ne1,,0xa,Transfer,0xc1,0xs1,Confirmed,abc,2024-01-01 00:00:00,1,0,eu\n", HEADER),
        )
        .unwrap();

        match load_contract_events(file.path()) {
            Err(AnalyzerError::Malformed { column, value, .. }) => {
                assert_eq!(column, "block_number");
                assert_eq!(value, "abc");
            }
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_load_keeps_null_counts_of_extra_columns() {
        let file = NamedTempFile::new().unwrap();
        let content = "\
event_id,notes,previous_event_id,tx_hash,event_type,contract_address,sender,status,block_number,block_timestamp,gas_used,tx_index,node_region,source
e1,,,0xa,Transfer,0xc1,0xs1,Confirmed,100,2024-01-01 00:00:00,21000,0,eu,feed
e2,,e1,0xb,Approval,0xc1,0xs2,Confirmed,101,2024-01-01 00:00:05,21000,1,us,
";
        fs::write(file.path(), content).unwrap();

        let table = load_contract_events(file.path()).unwrap();
        assert_eq!(table.columns.len(), 12);
        assert_eq!(table.extra_columns.len(), 2);

        let mut analyzer = BonusAnalyzer::new(&table);
        let issues: Vec<(String, usize)> = analyzer
            .detect_data_issues()
            .unwrap()
            .iter()
            .map(|i| (i.column.clone(), i.count))
            .collect();
        assert_eq!(
            issues,
            vec![
                ("notes".to_string(), 2),
                ("previous_event_id".to_string(), 1),
                ("source".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_load_na_spellings_are_null() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            format!(
                "{}\ne1,None,0xa,Transfer,0xc1,0xs1,NA,NaN,null,N/A,0,eu\ne2,e1,0xb,Transfer,0xc1,0xs1,Confirmed,5,2024-01-01 00:00:00,1,0,eu\n",
                HEADER
            ),
        )
        .unwrap();

        let table = load_contract_events(file.path()).unwrap();
        let first = &table.records[0];
        assert_eq!(first.previous_event_id, None);
        assert_eq!(first.status, None);
        assert_eq!(first.block_number, None);
        assert_eq!(first.block_timestamp, None);
        assert_eq!(first.gas_used, None);

        let (orphans, _) = find_orphan_events(&table).unwrap();
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    // orphans

    #[test]
    fn test_find_orphan_events() {
        let table = EventTable::from_records(vec![
            make_event("e1", None, "0xc1", "s1", 1, 0),
            make_event("e2", Some("e1"), "0xc1", "s1", 1, 1),
            make_event("e3", Some("ghost"), "0xc2", "s2", 2, 2),
            make_event("e4", None, "0xc2", "s2", 2, 3),
        ]);

        let (orphans, summary) = find_orphan_events(&table).unwrap();

        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].event_id.as_deref(), Some("e3"));
        assert_eq!(orphans[0].previous_event_id.as_deref(), Some("ghost"));
        assert_eq!(orphans[0].block_number, Some(2));

        assert_eq!(summary.stats.total_events, 4);
        assert_eq!(summary.stats.events_with_previous_id, 2);
        assert_eq!(summary.stats.orphan_events, 1);
        assert_eq!(summary.stats.orphan_percentage, 50.0);
        assert_eq!(summary.stats.orphan_vs_total_percentage, 25.0);

        assert_eq!(summary.top_contracts_with_orphans.len(), 1);
        assert_eq!(summary.top_contracts_with_orphans[0].key, "0xc2");
        assert_eq!(summary.orphan_events_by_type[0].key, "Transfer");

        let range = summary.orphan_time_range.unwrap();
        assert_eq!(range.earliest, Some(base_time()));
        assert_eq!(range.latest, Some(base_time() + Duration::seconds(3)));
    }

    #[test]
    fn test_orphan_previous_ids_never_exist() {
        let table = EventTable::from_records(vec![
            make_event("a", Some("b"), "0xc1", "s1", 1, 0),
            make_event("b", Some("x"), "0xc1", "s1", 1, 1),
            make_event("c", Some("y"), "0xc1", "s1", 1, 2),
            make_event("d", Some("a"), "0xc1", "s1", 1, 3),
        ]);

        let (orphans, _) = find_orphan_events(&table).unwrap();
        let ids: HashSet<String> = table
            .records
            .iter()
            .filter_map(|r| r.event_id.clone())
            .collect();

        assert_eq!(orphans.len(), 2);
        for orphan in &orphans {
            assert!(!ids.contains(orphan.previous_event_id.as_ref().unwrap()));
        }
    }

    #[test]
    fn test_no_chained_events_gives_empty_result() {
        let table = EventTable::from_records(vec![
            make_event("e1", None, "0xc1", "s1", 1, 0),
            make_event("e2", None, "0xc1", "s1", 1, 1),
        ]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("orphans.csv");

        let mut detector = OrphanDetector::new(&table);
        assert!(detector.find_orphan_events().unwrap().is_empty());

        let stats = detector.stats().unwrap();
        assert_eq!(stats.events_with_previous_id, 0);
        assert_eq!(stats.orphan_percentage, 0.0);
        assert_eq!(stats.orphan_vs_total_percentage, 0.0);

        detector.export(&path).unwrap();
        assert!(detector.state().is_exported());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "event_id,previous_event_id,contract_address,event_type,block_number\n"
        );
    }

    #[test]
    fn test_orphan_summary_before_detection() {
        let table = EventTable::from_records(vec![make_event("e1", None, "0xc1", "s1", 1, 0)]);
        let detector = OrphanDetector::new(&table);

        assert!(matches!(
            detector.summary(),
            Err(AnalyzerError::NotComputed { .. })
        ));
    }

    #[test]
    fn test_orphan_requires_columns() {
        let mut table = EventTable::from_records(vec![make_event("e1", None, "0xc1", "s1", 1, 0)]);
        table.columns.retain(|c| *c != Column::PreviousEventId);

        match OrphanDetector::new(&table).find_orphan_events() {
            Err(AnalyzerError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["previous_event_id"]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_export_orphans_csv() {
        let table = EventTable::from_records(vec![
            make_event("e1", None, "0xc1", "s1", 7, 0),
            make_event("e2", Some("gone"), "0xc1", "s1", 7, 1),
        ]);
        let file = NamedTempFile::new().unwrap();

        let mut detector = OrphanDetector::new(&table);
        detector.find_orphan_events().unwrap();
        detector.export(file.path()).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "event_id,previous_event_id,contract_address,event_type,block_number\ne2,gone,0xc1,Transfer,7\n"
        );
    }

    // sender mapping

    fn sender_table() -> EventTable {
        let mut records = Vec::new();
        let mut push = |sender: &str, block: i64, n: usize| {
            for _ in 0..n {
                let id = format!("e{}", records.len());
                records.push(make_event(&id, None, "0xc1", sender, block, 0));
            }
        };
        push("s1", 11, 3);
        push("s1", 10, 3);
        push("s1", 12, 1);
        push("s2", 20, 3);
        push("s3", 30, 1);
        push("s4", 40, 2);

        let mut no_sender = make_event("x1", None, "0xc1", "s9", 99, 0);
        no_sender.sender = None;
        let mut no_block = make_event("x2", None, "0xc1", "s9", 99, 0);
        no_block.block_number = None;
        records.push(no_sender);
        records.push(no_block);

        EventTable::from_records(records)
    }

    #[test]
    fn test_map_sender_activity() {
        let table = sender_table();
        let (activity, summary) = map_sender_activity(&table).unwrap();

        let rows: Vec<(&str, i64, usize, usize)> = activity
            .iter()
            .map(|a| {
                (
                    a.sender.as_str(),
                    a.block_number,
                    a.event_count,
                    a.rank_in_sender_activity,
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("s1", 10, 3, 1),
                ("s2", 20, 3, 1),
                ("s4", 40, 2, 3),
                ("s3", 30, 1, 4),
            ]
        );

        assert_eq!(summary.stats.total_senders, 4);
        assert_eq!(summary.stats.avg_events_per_sender, Some(2.25));
        assert_eq!(summary.stats.median_events_per_sender, Some(2.5));
        assert_eq!(summary.stats.max_events_in_block, Some(3));
        assert_eq!(summary.stats.min_events_in_block, Some(1));

        assert_eq!(summary.top_senders.len(), 4);
        assert_eq!(summary.top_senders[0].sender, "s1");
        assert_eq!(summary.top_senders[3].rank_in_sender_activity, 4);
    }

    #[test]
    fn test_sender_rank_counts_strictly_greater_rows() {
        let table = sender_table();
        let (activity, _) = map_sender_activity(&table).unwrap();

        for row in &activity {
            let greater = activity
                .iter()
                .filter(|other| other.event_count > row.event_count)
                .count();
            assert_eq!(row.rank_in_sender_activity, greater + 1);
        }
    }

    #[test]
    fn test_top_senders_capped_at_ten() {
        let mut records = Vec::new();
        for i in 0..12 {
            records.extend(sender_events(&format!("s{:02}", i), i + 1, 1));
        }
        let table = EventTable::from_records(records);

        let (activity, summary) = map_sender_activity(&table).unwrap();
        assert_eq!(activity.len(), 12);
        assert_eq!(summary.top_senders.len(), 10);

        let ranks: Vec<usize> = summary
            .top_senders
            .iter()
            .map(|s| s.rank_in_sender_activity)
            .collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<usize>>());
        assert_eq!(summary.top_senders[0].sender, "s11");
        assert_eq!(summary.top_senders[0].event_count, 12);
        assert_eq!(summary.top_senders[9].sender, "s02");
    }

    #[test]
    fn test_sender_requires_columns() {
        let mut table = sender_table();
        table.columns.retain(|c| *c != Column::BlockNumber);

        match SenderMapper::new(&table).map_sender_activity() {
            Err(AnalyzerError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["block_number"]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_sender_stats_before_mapping() {
        let table = sender_table();
        let mapper = SenderMapper::new(&table);
        assert!(matches!(mapper.stats(), Err(AnalyzerError::NotComputed { .. })));
        assert!(matches!(mapper.summary(), Err(AnalyzerError::NotComputed { .. })));
    }

    #[test]
    fn test_sender_export_is_idempotent() {
        let table = sender_table();
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");

        let mut mapper = SenderMapper::new(&table);
        mapper.map_sender_activity().unwrap();
        mapper.export(&first).unwrap();

        let mut again = SenderMapper::new(&table);
        again.map_sender_activity().unwrap();
        again.export(&second).unwrap();

        let content = fs::read(&first).unwrap();
        assert_eq!(content, fs::read(&second).unwrap());
        assert!(String::from_utf8(content)
            .unwrap()
            .starts_with("sender,block_number,event_count,rank_in_sender_activity\ns1,10,3,1\n"));
    }

    // time deltas

    #[test]
    fn test_time_deltas_example() {
        let table = EventTable::from_records(vec![
            make_event("e4", None, "0xc1", "s1", 1, 20),
            make_event("e1", None, "0xc1", "s1", 1, 0),
            make_event("e2", None, "0xc1", "s1", 1, 5),
            make_event("e3", None, "0xc1", "s1", 1, 5),
        ]);

        let (deltas, summary) = calculate_time_deltas(&table).unwrap();

        let ids: Vec<&str> = deltas.iter().map(|d| d.event_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3", "e4"]);

        let values: Vec<Option<f64>> = deltas.iter().map(|d| d.seconds_since_last_event).collect();
        assert_eq!(values, vec![None, Some(5.0), Some(0.0), Some(15.0)]);

        assert_eq!(summary.stats.total_contracts, 1);
        assert_eq!(summary.stats.total_events_with_deltas, 3);
        assert!((summary.stats.avg_time_delta_seconds.unwrap() - 6.67).abs() < 0.01);
        assert_eq!(summary.stats.median_time_delta_seconds, Some(5.0));
        assert_eq!(summary.stats.min_time_delta_seconds, Some(0.0));
        assert_eq!(summary.stats.max_time_delta_seconds, Some(15.0));
    }

    #[test]
    fn test_time_deltas_per_contract() {
        let mut orphan_contract = make_event("n1", None, "0xc0", "s1", 1, 50);
        orphan_contract.contract_address = None;

        let table = EventTable::from_records(vec![
            make_event("b2", None, "0xcb", "s1", 1, 160),
            make_event("a1", None, "0xca", "s1", 1, 10),
            orphan_contract,
            make_event("b1", None, "0xcb", "s1", 1, 100),
            make_event("a2", None, "0xca", "s1", 1, 13),
            make_event("a3", None, "0xca", "s1", 1, 12),
        ]);

        let (deltas, summary) = calculate_time_deltas(&table).unwrap();

        let ids: Vec<&str> = deltas.iter().map(|d| d.event_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["a1", "a3", "a2", "b1", "b2", "n1"]);

        for contract in ["0xca", "0xcb"] {
            let rows: Vec<_> = deltas
                .iter()
                .filter(|d| d.contract_address.as_deref() == Some(contract))
                .collect();
            let with_delta = rows.iter().filter(|d| d.seconds_since_last_event.is_some()).count();
            assert_eq!(with_delta, rows.len() - 1);
            assert!(rows
                .iter()
                .filter_map(|d| d.seconds_since_last_event)
                .all(|s| s >= 0.0));
        }
        assert_eq!(deltas[5].seconds_since_last_event, None);

        assert_eq!(summary.stats.total_contracts, 2);
        assert_eq!(summary.top_contracts_by_activity[0].key, "0xca");
        assert_eq!(summary.top_contracts_by_activity[0].count, 3);
        assert_eq!(summary.top_contracts_by_activity.len(), 2);
    }

    #[test]
    fn test_time_deltas_require_columns() {
        let mut table = EventTable::from_records(vec![make_event("e1", None, "0xc1", "s1", 1, 0)]);
        table.columns.retain(|c| *c != Column::BlockTimestamp && *c != Column::ContractAddress);

        match TimeDeltaCalculator::new(&table).calculate_time_deltas() {
            Err(AnalyzerError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["block_timestamp", "contract_address"]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_export_time_deltas_csv() {
        let table = EventTable::from_records(vec![
            make_event("e1", None, "0xc1", "s1", 1, 0),
            make_event("e2", None, "0xc1", "s1", 1, 5),
        ]);
        let file = NamedTempFile::new().unwrap();

        let mut calculator = TimeDeltaCalculator::new(&table);
        assert!(matches!(
            calculator.export(file.path()),
            Err(AnalyzerError::NotComputed { .. })
        ));

        calculator.calculate_time_deltas().unwrap();
        calculator.export(file.path()).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "event_id,contract_address,event_type,block_timestamp,seconds_since_last_event\n\
             e1,0xc1,Transfer,2023-11-14 22:13:20,\n\
             e2,0xc1,Transfer,2023-11-14 22:13:25,5.0\n"
        );
    }

    // bonus

    #[test]
    fn test_detect_bot_behavior() {
        let mut records = sender_events("S", 150, 4);
        records.extend(sender_events("T", 150, 50));
        records.extend(sender_events("U", 50, 1));
        let table = EventTable::from_records(records);

        let mut analyzer = BonusAnalyzer::new(&table);
        let behavior = analyzer.detect_bot_behavior().unwrap();

        let flags: Vec<(&str, usize, bool)> = behavior
            .iter()
            .map(|b| (b.sender.as_str(), b.event_count, b.is_bot_like))
            .collect();
        assert_eq!(
            flags,
            vec![("S", 150, true), ("T", 150, false), ("U", 50, false)]
        );
        assert_eq!(behavior[0].avg_time_between_events, Some(4.0));
        assert_eq!(behavior[1].avg_time_between_events, Some(50.0));
    }

    #[test]
    fn test_bot_behavior_requires_columns() {
        let mut table = EventTable::from_records(sender_events("S", 3, 1));
        table.columns.retain(|c| *c != Column::EventId);

        match BonusAnalyzer::new(&table).detect_bot_behavior() {
            Err(AnalyzerError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["event_id"]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_bot_gaps_follow_table_order() {
        let table = EventTable::from_records(vec![
            make_event("e1", None, "0xc1", "s1", 1, 10),
            make_event("e2", None, "0xc1", "s1", 1, 0),
            make_event("e3", None, "0xc1", "s2", 1, 0),
        ]);

        let mut analyzer = BonusAnalyzer::new(&table);
        let behavior = analyzer.detect_bot_behavior().unwrap();

        assert_eq!(behavior[0].sender, "s1");
        assert_eq!(behavior[0].avg_time_between_events, Some(-10.0));
        assert_eq!(behavior[1].sender, "s2");
        assert_eq!(behavior[1].avg_time_between_events, None);
        assert!(!behavior[1].is_bot_like);
    }

    #[test]
    fn test_detect_data_issues() {
        let mut reorged_a = make_event("e1", Some("e0"), "0xc1", "s1", 1, 0);
        reorged_a.status = Some("Reorged".to_string());
        let mut reorged_b = make_event("e2", Some("e1"), "0xc1", "s1", 1, 1);
        reorged_b.status = Some("Reorged".to_string());
        let mut reorged_c = make_event("e3", None, "0xc1", "s1", 1, 2);
        reorged_c.status = Some("Reorged".to_string());
        reorged_c.gas_used = None;

        let table = EventTable::from_records(vec![reorged_a, reorged_b, reorged_c]);
        let mut analyzer = BonusAnalyzer::new(&table);
        let issues = analyzer.detect_data_issues().unwrap().to_vec();

        let missing: Vec<(&str, usize)> = issues
            .iter()
            .filter(|i| i.issue_type == IssueType::Missing)
            .map(|i| (i.column.as_str(), i.count))
            .collect();
        assert_eq!(missing, vec![("previous_event_id", 1), ("gas_used", 1)]);

        let chain = issues
            .iter()
            .find(|i| i.issue_type == IssueType::InvalidReorgedChain)
            .unwrap();
        assert_eq!(chain.column, "status");
        assert_eq!(chain.count, 2);
    }

    #[test]
    fn test_export_bonus_csv() {
        let mut table = EventTable::from_records(vec![
            make_event("e1", None, "0xc1", "s1", 1, 0),
            make_event("e2", None, "0xc1", "s1", 1, 5),
        ]);
        table.records[1].node_region = None;
        let file = NamedTempFile::new().unwrap();

        let mut analyzer = BonusAnalyzer::new(&table);
        analyzer.detect_bot_behavior().unwrap();
        assert!(matches!(
            analyzer.export(file.path()),
            Err(AnalyzerError::NotComputed { .. })
        ));

        analyzer.detect_data_issues().unwrap();
        analyzer.export(file.path()).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "sender,event_count,avg_time_between_events,is_bot_like,analysis_type,column,issue_type,count\n\
             s1,2,5.0,false,bot_behavior,,,\n\
             ,,,,data_issue,previous_event_id,missing,2\n\
             ,,,,data_issue,node_region,missing,1\n"
        );
    }

    #[test]
    fn test_analyze_bonus_summary() {
        let mut records = sender_events("S", 150, 4);
        records.extend(sender_events("U", 50, 1));
        let table = EventTable::from_records(records);

        let (behavior, summary) = analyze_bonus(&table).unwrap();
        assert_eq!(behavior.len(), 2);
        assert_eq!(behavior[0].sender, "S");
        assert_eq!(summary.bot_like_senders, 1);
        assert_eq!(summary.event_count.count, 2);
        assert_eq!(summary.event_count.max, Some(150.0));
        assert_eq!(summary.avg_time_between_events.min, Some(1.0));
        assert_eq!(summary.data_issues.len(), 1);
        assert_eq!(summary.data_issues[0].column, "previous_event_id");
    }

    #[test]
    fn test_bonus_summary_describes_distribution() {
        let mut records = Vec::new();
        for (sender, count) in [("A", 1), ("B", 2), ("C", 3), ("D", 4)] {
            records.extend(sender_events(sender, count, 6));
        }
        let table = EventTable::from_records(records);

        let (_, summary) = analyze_bonus(&table).unwrap();

        let counts = &summary.event_count;
        assert_eq!(counts.count, 4);
        assert_eq!(counts.mean, Some(2.5));
        assert!((counts.std.unwrap() - (5.0_f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(counts.min, Some(1.0));
        assert_eq!(counts.p25, Some(1.75));
        assert_eq!(counts.p50, Some(2.5));
        assert_eq!(counts.p75, Some(3.25));
        assert_eq!(counts.max, Some(4.0));

        let gaps = &summary.avg_time_between_events;
        assert_eq!(gaps.count, 3);
        assert_eq!(gaps.std, Some(0.0));
        assert_eq!(gaps.p50, Some(6.0));
    }
}
