//! end-to-end: config file on disk -> feed cycles -> json files on disk

use std::fs;
use tempfile::TempDir;
use water_feed::{Cycle, Feed, FeedConfig, Sample};

#[test]
fn configured_feed_publishes_and_wraps() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(
        root.join("readings.csv"),
        "time,ph,ntu,temp_c,tds,cond\n\
         2024-05-01T08:00:00+02:00,7.0,1.1,18.0,300,450\n\
         2024-05-01T08:00:04+02:00,7.1,1.2,18.1,301,451\n",
    )
    .unwrap();

    let toml = format!(
        r#"
[paths]
source  = "{root}/readings.csv"
current = "{root}/feed/data.json"
history = "{root}/feed/history.json"
state   = "{root}/feed/state.json"

[history]
max_len = 3

[columns]
timestamp    = "time"
ph           = "ph"
turbidity    = "ntu"
temperature  = "temp_c"
tds          = "tds"
conductivity = "cond"
"#,
        root = root.display().to_string().replace('\\', "/")
    );
    fs::write(root.join("feed.toml"), toml).unwrap();

    let config = FeedConfig::load(root.join("feed.toml")).unwrap();
    let mut feed = Feed::new(config);
    feed.prepare_dirs().unwrap();

    for _ in 0..5 {
        assert!(matches!(feed.run_cycle().unwrap(), Cycle::Published { rows: 2, .. }));
    }

    let current: Sample =
        serde_json::from_str(&fs::read_to_string(root.join("feed/data.json")).unwrap()).unwrap();
    assert_eq!(current.timestamp, "2024-05-01T08:00:00+02:00");
    assert_eq!(current.tds, 300.0);

    let history: Vec<Sample> =
        serde_json::from_str(&fs::read_to_string(root.join("feed/history.json")).unwrap()).unwrap();
    let phs: Vec<f64> = history.iter().map(|s| s.ph).collect();
    assert_eq!(phs, vec![7.0, 7.1, 7.0]);

    assert_eq!(fs::read_to_string(root.join("feed/state.json")).unwrap(), r#"{"cursor":1}"#);
}
