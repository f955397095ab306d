//! Historical draft records and the CSV dataset they are read from.

use crate::error::AppError;
use crate::hero::HeroId;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const TEAM_SIZE: usize = 5;
pub const PRE_BANS_PER_SIDE: usize = 2;
/// Picks, pre-bans and post-bans of both sides.
pub const DRAFT_SLOTS: usize = 16;

/// Required CSV header: the draft slots in model order, then the two flags.
pub const DATASET_COLUMNS: [&str; DRAFT_SLOTS + 2] = [
    "enemy1",
    "main1",
    "enemy2",
    "main2",
    "enemy3",
    "main3",
    "enemy4",
    "main4",
    "enemy5",
    "main5",
    "main_pre_b1",
    "enemy_pre_b1",
    "main_pre_b2",
    "enemy_pre_b2",
    "main_post_b",
    "enemy_post_b",
    "is_first",
    "is_win",
];

/// Slots in model column order: alternating enemy/main picks, then
/// main/enemy pre-bans interleaved, then the two post-bans.
pub fn model_slot_order<'a>(
    main: &'a [Option<HeroId>; TEAM_SIZE],
    enemy: &'a [Option<HeroId>; TEAM_SIZE],
    main_pre_bans: &'a [Option<HeroId>; PRE_BANS_PER_SIDE],
    enemy_pre_bans: &'a [Option<HeroId>; PRE_BANS_PER_SIDE],
    main_post_ban: Option<&'a HeroId>,
    enemy_post_ban: Option<&'a HeroId>,
) -> [Option<&'a HeroId>; DRAFT_SLOTS] {
    [
        enemy[0].as_ref(),
        main[0].as_ref(),
        enemy[1].as_ref(),
        main[1].as_ref(),
        enemy[2].as_ref(),
        main[2].as_ref(),
        enemy[3].as_ref(),
        main[3].as_ref(),
        enemy[4].as_ref(),
        main[4].as_ref(),
        main_pre_bans[0].as_ref(),
        enemy_pre_bans[0].as_ref(),
        main_pre_bans[1].as_ref(),
        enemy_pre_bans[1].as_ref(),
        main_post_ban,
        enemy_post_ban,
    ]
}

/// One historical draft. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub main: [Option<HeroId>; TEAM_SIZE],
    pub enemy: [Option<HeroId>; TEAM_SIZE],
    pub main_pre_bans: [Option<HeroId>; PRE_BANS_PER_SIDE],
    pub enemy_pre_bans: [Option<HeroId>; PRE_BANS_PER_SIDE],
    pub main_post_ban: Option<HeroId>,
    pub enemy_post_ban: Option<HeroId>,
    pub main_first: bool,
    pub main_won: bool,
}

impl MatchRecord {
    pub fn new(main: [Option<HeroId>; TEAM_SIZE], enemy: [Option<HeroId>; TEAM_SIZE]) -> Self {
        MatchRecord {
            main,
            enemy,
            main_pre_bans: [None, None],
            enemy_pre_bans: [None, None],
            main_post_ban: None,
            enemy_post_ban: None,
            main_first: false,
            main_won: false,
        }
    }

    pub fn main_heroes(&self) -> impl Iterator<Item = &HeroId> {
        self.main.iter().flatten()
    }

    pub fn enemy_heroes(&self) -> impl Iterator<Item = &HeroId> {
        self.enemy.iter().flatten()
    }

    /// The hero that opened the draft.
    pub fn first_pick(&self) -> Option<&HeroId> {
        if self.main_first {
            self.main[0].as_ref()
        } else {
            self.enemy[0].as_ref()
        }
    }

    pub fn draft_slots(&self) -> [Option<&HeroId>; DRAFT_SLOTS] {
        model_slot_order(
            &self.main,
            &self.enemy,
            &self.main_pre_bans,
            &self.enemy_pre_bans,
            self.main_post_ban.as_ref(),
            self.enemy_post_ban.as_ref(),
        )
    }

    fn has_picks(&self) -> bool {
        self.main_heroes().next().is_some() || self.enemy_heroes().next().is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    enemy1: Option<String>,
    main1: Option<String>,
    enemy2: Option<String>,
    main2: Option<String>,
    enemy3: Option<String>,
    main3: Option<String>,
    enemy4: Option<String>,
    main4: Option<String>,
    enemy5: Option<String>,
    main5: Option<String>,
    main_pre_b1: Option<String>,
    enemy_pre_b1: Option<String>,
    main_pre_b2: Option<String>,
    enemy_pre_b2: Option<String>,
    main_post_b: Option<String>,
    enemy_post_b: Option<String>,
    is_first: Option<String>,
    is_win: Option<String>,
}

fn hero(value: &Option<String>) -> Option<HeroId> {
    value.as_deref().and_then(HeroId::parse)
}

fn flag(value: &Option<String>) -> Option<bool> {
    match value.as_deref().map(str::trim) {
        Some("1") | Some("1.0") | Some("true") | Some("True") => Some(true),
        Some("0") | Some("0.0") | Some("false") | Some("False") => Some(false),
        _ => None,
    }
}

impl RawRow {
    fn into_record(self) -> Option<MatchRecord> {
        // is_win == 0 means the main side won
        let main_won = !flag(&self.is_win)?;
        let record = MatchRecord {
            main: [
                hero(&self.main1),
                hero(&self.main2),
                hero(&self.main3),
                hero(&self.main4),
                hero(&self.main5),
            ],
            enemy: [
                hero(&self.enemy1),
                hero(&self.enemy2),
                hero(&self.enemy3),
                hero(&self.enemy4),
                hero(&self.enemy5),
            ],
            main_pre_bans: [hero(&self.main_pre_b1), hero(&self.main_pre_b2)],
            enemy_pre_bans: [hero(&self.enemy_pre_b1), hero(&self.enemy_pre_b2)],
            main_post_ban: hero(&self.main_post_b),
            enemy_post_ban: hero(&self.enemy_post_b),
            main_first: flag(&self.is_first).unwrap_or(false),
            main_won,
        };
        Some(record)
    }
}

/// Parse every usable record from CSV text with a header row.
///
/// Malformed rows and rows without a winner flag are skipped; a record
/// with no picks on either side is dropped.
pub fn read_matches<R: Read>(reader: R) -> Result<Vec<MatchRecord>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?;
    let missing: Vec<&str> = DATASET_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::DatasetError(format!(
            "missing columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (line, row) in csv_reader.deserialize::<RawRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::debug!("Skipping unreadable row {}: {}", line + 1, e);
                skipped += 1;
                continue;
            }
        };

        match row.into_record() {
            Some(record) if record.has_picks() => records.push(record),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} dataset rows with no picks or no winner flag", skipped);
    }

    Ok(records)
}

pub fn load_dataset(path: &Path) -> Result<Vec<MatchRecord>, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    let records = read_matches(file)?;
    log::info!("Loaded {} matches from {}", records.len(), path.display());

    if records.is_empty() {
        return Err(AppError::EmptyDataset);
    }
    Ok(records)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> String {
        DATASET_COLUMNS.join(",")
    }

    #[test]
    fn test_read_matches_parses_columns() {
        let csv = format!(
            "{}\nE1,M1,E2,M2,E3,M3,E4,M4,E5,M5,MB1,EB1,MB2,EB2,MP,EP,1,0\n",
            header()
        );
        let records = read_matches(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.main[0], Some(HeroId::new("M1")));
        assert_eq!(record.enemy[4], Some(HeroId::new("E5")));
        assert_eq!(record.main_pre_bans[1], Some(HeroId::new("MB2")));
        assert_eq!(record.enemy_post_ban, Some(HeroId::new("EP")));
        assert!(record.main_first);
        assert!(record.main_won);
        assert_eq!(record.first_pick(), Some(&HeroId::new("M1")));
    }

    #[test]
    fn test_missing_slot_is_absent_not_dropped() {
        let csv = format!("{}\nE1,,E2,M2,,M3,E4,M4,E5,M5,,,,,,,0,1\n", header());
        let records = read_matches(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].main[0], None);
        assert_eq!(records[0].enemy[2], None);
        assert_eq!(records[0].main_heroes().count(), 4);
        assert!(!records[0].main_won);
    }

    #[test]
    fn test_rows_without_picks_or_winner_are_skipped() {
        let csv = format!(
            "{}\n,,,,,,,,,,B1,B2,,,,,0,0\nE1,M1,,,,,,,,,,,,,,,0,x\nE1,M1,,,,,,,,,,,,,,,0,1\n",
            header()
        );
        let records = read_matches(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let csv = "enemy1,main1,is_first\nE1,M1,0\n";
        match read_matches(csv.as_bytes()) {
            Err(AppError::DatasetError(message)) => {
                assert!(message.contains("is_win"));
                assert!(!message.contains("main1,"));
            }
            other => panic!("expected a dataset error, got {:?}", other),
        }
    }

    #[test]
    fn test_draft_slots_order() {
        let record = fixtures::record(["M1", "M2", "", "", ""], ["E1", "", "", "", ""], false, true);
        let slots = record.draft_slots();
        assert_eq!(slots[0], Some(&HeroId::new("E1")));
        assert_eq!(slots[1], Some(&HeroId::new("M1")));
        assert_eq!(slots[3], Some(&HeroId::new("M2")));
        assert_eq!(slots[2], None);
    }
}
