use chrono::TimeZone;

use super::*;

fn parse(args: &[&str]) -> Action {
    let command = Command::try_parse_from(args).unwrap();
    command.action()
}

#[test]
fn test_default_action_is_serve() {
    assert_eq!(parse(&["chatport"]), Action::Serve { listen: None });
}

#[test]
fn test_list_filters() {
    let action = parse(&[
        "chatport",
        "list",
        "--title",
        "trip",
        "-q",
        "tent",
        "--since",
        "2024-05-01T08:00:00Z",
    ]);
    let since = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    assert_eq!(
        action,
        Action::List {
            title: Some("trip".to_string()),
            contains: Some("tent".to_string()),
            since: Some(since),
        }
    );

    let Action::List {
        title,
        contains,
        since,
    } = action
    else {
        unreachable!()
    };
    let filter = list_filter(title, contains, since);
    assert_eq!(filter.title(), Some("trip"));
    assert_eq!(filter.message_contains(), Some("tent"));
    assert_eq!(filter.updated(), TimeRange::since(since.unwrap()));
    assert!(filter.created().is_open());
}

#[test]
fn test_list_without_filters() {
    let action = parse(&["chatport", "list"]);
    let Action::List {
        title,
        contains,
        since,
    } = action
    else {
        panic!("expected list, got {:?}", action)
    };
    assert_eq!(list_filter(title, contains, since), FilterChat::default());
}

#[test]
fn test_list_rejects_bad_time() {
    assert!(Command::try_parse_from(["chatport", "list", "--since", "yesterday"]).is_err());
}
