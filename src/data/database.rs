//! SQLite database management for league data

use crate::data::repository::{LeagueRepository, MatchFilter, PlayerStatFilter};
use crate::data::snapshot::LeagueSnapshot;
use crate::{
    LeagueError, Match, MatchId, MatchMap, MatchStatus, MatchType, Player, PlayerId,
    PlayerMapStat, Result, SeriesFormat, Team, TeamId,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

/// Result entered by an admin for one match
#[derive(Debug, Clone, Default)]
pub struct ScoreEntry {
    pub score_t1: u32,
    pub score_t2: u32,
    /// Explicit winner; derived from the scores (or map wins) when absent
    pub winner: Option<TeamId>,
    pub is_forfeit: bool,
    pub maps: Vec<MatchMap>,
}

/// Rows written by a snapshot import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub teams: usize,
    pub players: usize,
    pub matches: usize,
    pub maps: usize,
    pub player_stats: usize,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag TEXT,
                name TEXT NOT NULL UNIQUE,
                group_name TEXT
            );

            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                riot_id TEXT,
                rank TEXT,
                default_team_id INTEGER REFERENCES teams(id)
            );

            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                week INTEGER NOT NULL DEFAULT 0,
                group_name TEXT,
                team1_id INTEGER NOT NULL REFERENCES teams(id),
                team2_id INTEGER NOT NULL REFERENCES teams(id),
                winner_id INTEGER REFERENCES teams(id),
                score_t1 INTEGER NOT NULL DEFAULT 0,
                score_t2 INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'scheduled',
                match_type TEXT NOT NULL DEFAULT 'regular',
                format TEXT,
                maps_played INTEGER NOT NULL DEFAULT 0,
                is_forfeit INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS match_maps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER NOT NULL REFERENCES matches(id),
                map_index INTEGER NOT NULL,
                map_name TEXT,
                team1_rounds INTEGER NOT NULL DEFAULT 0,
                team2_rounds INTEGER NOT NULL DEFAULT 0,
                winner_id INTEGER,
                is_forfeit INTEGER NOT NULL DEFAULT 0,
                UNIQUE(match_id, map_index)
            );

            CREATE TABLE IF NOT EXISTS match_stats_map (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER NOT NULL,
                map_index INTEGER NOT NULL,
                team_id INTEGER NOT NULL,
                player_id INTEGER,
                is_sub INTEGER NOT NULL DEFAULT 0,
                subbed_for_id INTEGER,
                agent TEXT,
                acs INTEGER,
                kills INTEGER NOT NULL DEFAULT 0,
                deaths INTEGER NOT NULL DEFAULT 0,
                assists INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS model_artifacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                metadata TEXT NOT NULL,
                weights BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_matches_week ON matches(week);
            CREATE INDEX IF NOT EXISTS idx_matches_teams ON matches(team1_id, team2_id);
            CREATE INDEX IF NOT EXISTS idx_stats_team ON match_stats_map(team_id);
            CREATE INDEX IF NOT EXISTS idx_stats_player ON match_stats_map(player_id);
            "#,
        )?;
        Ok(())
    }

    // ==================== Team Operations ====================

    /// Insert a team, or update the row with the same id
    pub fn upsert_team(&self, team: &Team) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO teams (id, tag, name, group_name) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                tag = excluded.tag,
                name = excluded.name,
                group_name = excluded.group_name
            "#,
            params![team.id.0, team.tag, team.name, team.group],
        )?;
        Ok(())
    }

    /// Create a team with a fresh id
    pub fn create_team(&self, name: &str, tag: Option<&str>, group: Option<&str>) -> Result<Team> {
        self.conn.execute(
            "INSERT INTO teams (tag, name, group_name) VALUES (?1, ?2, ?3)",
            params![tag, name, group],
        )?;
        Ok(Team {
            id: TeamId(self.conn.last_insert_rowid()),
            name: name.to_string(),
            tag: tag.map(str::to_string),
            group: group.map(str::to_string),
        })
    }

    /// Find a team by name or tag
    pub fn find_team_by_name(&self, name: &str) -> Result<Option<Team>> {
        let name_lower = name.trim().to_lowercase();
        let team = self
            .conn
            .query_row(
                "SELECT id, tag, name, group_name FROM teams
                 WHERE LOWER(name) = ?1 OR LOWER(tag) = ?1
                 ORDER BY id LIMIT 1",
                params![name_lower],
                Self::row_to_team,
            )
            .optional()?;
        Ok(team)
    }

    /// Get team by ID
    pub fn get_team(&self, id: TeamId) -> Result<Team> {
        self.conn
            .query_row(
                "SELECT id, tag, name, group_name FROM teams WHERE id = ?1",
                params![id.0],
                Self::row_to_team,
            )
            .optional()?
            .ok_or(LeagueError::UnknownTeam(id))
    }

    fn row_to_team(row: &rusqlite::Row) -> rusqlite::Result<Team> {
        Ok(Team {
            id: TeamId(row.get(0)?),
            tag: row.get(1)?,
            name: row.get(2)?,
            group: row.get(3)?,
        })
    }

    // ==================== Player Operations ====================

    pub fn upsert_player(&self, player: &Player) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO players (id, name, riot_id, rank, default_team_id) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                riot_id = excluded.riot_id,
                rank = excluded.rank,
                default_team_id = excluded.default_team_id
            "#,
            params![
                player.id.0,
                player.name,
                player.riot_id,
                player.rank,
                player.default_team.map(|t| t.0),
            ],
        )?;
        Ok(())
    }

    // ==================== Match Operations ====================

    /// Insert a match, or update the row with the same id
    pub fn upsert_match(&self, record: &Match) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO matches (id, week, group_name, team1_id, team2_id, winner_id,
                                 score_t1, score_t2, status, match_type, format,
                                 maps_played, is_forfeit)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                week = excluded.week,
                group_name = excluded.group_name,
                team1_id = excluded.team1_id,
                team2_id = excluded.team2_id,
                winner_id = excluded.winner_id,
                score_t1 = excluded.score_t1,
                score_t2 = excluded.score_t2,
                status = excluded.status,
                match_type = excluded.match_type,
                format = excluded.format,
                maps_played = excluded.maps_played,
                is_forfeit = excluded.is_forfeit
            "#,
            params![
                record.id.0,
                record.week,
                record.group,
                record.team1.0,
                record.team2.0,
                record.winner.map(|w| w.0),
                record.score_t1,
                record.score_t2,
                record.status.code(),
                record.match_type.code(),
                record.format.map(|f| f.code()),
                record.maps_played,
                record.is_forfeit,
            ],
        )?;
        Ok(())
    }

    /// Insert or update the maps of a match, keyed by map index
    pub fn upsert_match_maps(&self, match_id: MatchId, maps: &[MatchMap]) -> Result<usize> {
        let mut count = 0;
        for map in maps {
            self.conn.execute(
                r#"
                INSERT INTO match_maps (match_id, map_index, map_name, team1_rounds, team2_rounds,
                                        winner_id, is_forfeit)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(match_id, map_index) DO UPDATE SET
                    map_name = excluded.map_name,
                    team1_rounds = excluded.team1_rounds,
                    team2_rounds = excluded.team2_rounds,
                    winner_id = excluded.winner_id,
                    is_forfeit = excluded.is_forfeit
                "#,
                params![
                    match_id.0,
                    map.map_index,
                    map.map_name,
                    map.team1_rounds,
                    map.team2_rounds,
                    map.winner.map(|w| w.0),
                    map.is_forfeit,
                ],
            )?;
            count += 1;
        }
        Ok(count)
    }

    pub fn insert_player_map_stat(&self, stat: &PlayerMapStat) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO match_stats_map (match_id, map_index, team_id, player_id, is_sub,
                                         subbed_for_id, agent, acs, kills, deaths, assists)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                stat.match_id.0,
                stat.map_index,
                stat.team.0,
                stat.player.map(|p| p.0),
                stat.is_sub,
                stat.subbed_for.map(|p| p.0),
                stat.agent,
                stat.acs,
                stat.kills,
                stat.deaths,
                stat.assists,
            ],
        )?;
        Ok(())
    }

    /// Get match by ID
    pub fn get_match(&self, id: MatchId) -> Result<Match> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM matches WHERE id = ?1", MATCH_COLUMNS),
                params![id.0],
                Self::row_to_match,
            )
            .optional()?
            .ok_or(LeagueError::UnknownMatch(id))
    }

    /// Enter the result of a match and mark it completed.
    ///
    /// Re-entering a result overwrites the previous one, maps included.
    pub fn record_result(&self, id: MatchId, entry: &ScoreEntry) -> Result<Match> {
        let mut record = self.get_match(id)?;
        if let Some(w) = entry.winner {
            if !record.involves(w) {
                return Err(LeagueError::InvalidWinner {
                    match_id: id,
                    winner: w,
                });
            }
        }

        let map_wins = |team: TeamId| entry.maps.iter().filter(|m| m.winner == Some(team)).count();
        let derived = match entry.score_t1.cmp(&entry.score_t2) {
            std::cmp::Ordering::Greater => Some(record.team1),
            std::cmp::Ordering::Less => Some(record.team2),
            std::cmp::Ordering::Equal => match map_wins(record.team1).cmp(&map_wins(record.team2)) {
                std::cmp::Ordering::Greater => Some(record.team1),
                std::cmp::Ordering::Less => Some(record.team2),
                std::cmp::Ordering::Equal => None,
            },
        };

        record.score_t1 = entry.score_t1;
        record.score_t2 = entry.score_t2;
        record.winner = entry.winner.or(derived);
        record.is_forfeit = entry.is_forfeit;
        record.maps_played = entry.maps.len() as u32;
        record.status = MatchStatus::Completed;

        // The entered maps replace whatever was stored for the match
        let tx = self.conn.unchecked_transaction()?;
        self.upsert_match(&record)?;
        self.conn
            .execute("DELETE FROM match_maps WHERE match_id = ?1", params![id.0])?;
        self.upsert_match_maps(id, &entry.maps)?;
        tx.commit()?;

        log::info!(
            "Recorded {}: {} {} - {} {}",
            id,
            record.team1,
            record.score_t1,
            record.score_t2,
            record.team2
        );
        Ok(record)
    }

    /// Write every row of a snapshot in one transaction
    pub fn import_snapshot(&self, snapshot: &LeagueSnapshot) -> Result<ImportSummary> {
        let tx = self.conn.unchecked_transaction()?;
        let mut summary = ImportSummary::default();

        for team in &snapshot.teams {
            self.upsert_team(team)?;
            summary.teams += 1;
        }
        for player in &snapshot.players {
            self.upsert_player(player)?;
            summary.players += 1;
        }
        for record in &snapshot.matches {
            self.upsert_match(record)?;
            summary.matches += 1;
        }
        for record in &snapshot.matches {
            let maps: Vec<MatchMap> = snapshot
                .maps
                .iter()
                .filter(|m| m.match_id == record.id)
                .cloned()
                .collect();
            summary.maps += self.upsert_match_maps(record.id, &maps)?;
        }

        let imported: Vec<MatchId> = snapshot.matches.iter().map(|m| m.id).collect();
        for id in &imported {
            self.conn.execute(
                "DELETE FROM match_stats_map WHERE match_id = ?1",
                params![id.0],
            )?;
        }
        for stat in &snapshot.player_stats {
            self.insert_player_map_stat(stat)?;
            summary.player_stats += 1;
        }

        tx.commit()?;
        log::info!(
            "Imported {} teams, {} players, {} matches, {} maps, {} stat lines",
            summary.teams,
            summary.players,
            summary.matches,
            summary.maps,
            summary.player_stats
        );
        Ok(summary)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<Match> {
        let status: Option<String> = row.get(6)?;
        let match_type: Option<String> = row.get(7)?;
        let format: Option<String> = row.get(10)?;
        let winner: Option<i64> = row.get(5)?;

        Ok(Match {
            id: MatchId(row.get(0)?),
            week: row.get(1)?,
            group: row.get(2)?,
            team1: TeamId(row.get(3)?),
            team2: TeamId(row.get(4)?),
            winner: winner.map(TeamId),
            status: status
                .as_deref()
                .and_then(MatchStatus::from_code)
                .unwrap_or(MatchStatus::Scheduled),
            match_type: match_type
                .as_deref()
                .and_then(MatchType::from_code)
                .unwrap_or(MatchType::Regular),
            score_t1: row.get::<_, Option<u32>>(8)?.unwrap_or(0),
            score_t2: row.get::<_, Option<u32>>(9)?.unwrap_or(0),
            format: format.as_deref().and_then(SeriesFormat::from_code),
            maps_played: row.get::<_, Option<u32>>(11)?.unwrap_or(0),
            is_forfeit: row.get::<_, Option<bool>>(12)?.unwrap_or(false),
        })
    }

    fn row_to_map(row: &rusqlite::Row) -> rusqlite::Result<MatchMap> {
        let winner: Option<i64> = row.get(5)?;
        Ok(MatchMap {
            match_id: MatchId(row.get(0)?),
            map_index: row.get(1)?,
            map_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            team1_rounds: row.get::<_, Option<u32>>(3)?.unwrap_or(0),
            team2_rounds: row.get::<_, Option<u32>>(4)?.unwrap_or(0),
            winner: winner.map(TeamId),
            is_forfeit: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
        })
    }

    fn row_to_stat(row: &rusqlite::Row) -> rusqlite::Result<PlayerMapStat> {
        let player: Option<i64> = row.get(3)?;
        let subbed_for: Option<i64> = row.get(5)?;
        Ok(PlayerMapStat {
            match_id: MatchId(row.get(0)?),
            map_index: row.get(1)?,
            team: TeamId(row.get(2)?),
            player: player.map(PlayerId),
            is_sub: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
            subbed_for: subbed_for.map(PlayerId),
            agent: row.get(6)?,
            acs: row.get(7)?,
            kills: row.get::<_, Option<u32>>(8)?.unwrap_or(0),
            deaths: row.get::<_, Option<u32>>(9)?.unwrap_or(0),
            assists: row.get::<_, Option<u32>>(10)?.unwrap_or(0),
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let latest_week: Option<u32> = self
            .conn
            .query_row("SELECT MAX(week) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            team_count: count("SELECT COUNT(*) FROM teams")?,
            player_count: count("SELECT COUNT(*) FROM players")?,
            completed_matches: count("SELECT COUNT(*) FROM matches WHERE status = 'completed'")?,
            scheduled_matches: count("SELECT COUNT(*) FROM matches WHERE status = 'scheduled'")?,
            model_versions: count("SELECT COUNT(*) FROM model_artifacts")?,
            latest_week,
        })
    }
}

const MATCH_COLUMNS: &str = "id, week, group_name, team1_id, team2_id, winner_id, status, \
     match_type, score_t1, score_t2, format, maps_played, is_forfeit";

impl LeagueRepository for Database {
    fn list_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, tag, name, group_name FROM teams ORDER BY name")?;
        let teams = stmt
            .query_map([], Self::row_to_team)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, riot_id, rank, default_team_id FROM players ORDER BY name")?;
        let players = stmt
            .query_map([], |row| {
                let team: Option<i64> = row.get(4)?;
                Ok(Player {
                    id: PlayerId(row.get(0)?),
                    name: row.get(1)?,
                    riot_id: row.get(2)?,
                    rank: row.get(3)?,
                    default_team: team.map(TeamId),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(players)
    }

    fn list_matches(&self, filter: MatchFilter) -> Result<Vec<Match>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches
             WHERE (?1 IS NULL OR LOWER(COALESCE(match_type, 'regular')) = ?1)
               AND (?2 IS NULL OR LOWER(COALESCE(status, 'scheduled')) = ?2)
             ORDER BY week, id",
            MATCH_COLUMNS
        ))?;
        let matches = stmt
            .query_map(
                params![
                    filter.match_type.map(|t| t.code()),
                    filter.status.map(|s| s.code())
                ],
                Self::row_to_match,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn list_match_maps(&self, match_id: MatchId) -> Result<Vec<MatchMap>> {
        let mut stmt = self.conn.prepare(
            "SELECT match_id, map_index, map_name, team1_rounds, team2_rounds, winner_id, is_forfeit
             FROM match_maps WHERE match_id = ?1 ORDER BY map_index",
        )?;
        let maps = stmt
            .query_map(params![match_id.0], Self::row_to_map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(maps)
    }

    fn list_all_match_maps(&self) -> Result<Vec<MatchMap>> {
        let mut stmt = self.conn.prepare(
            "SELECT match_id, map_index, map_name, team1_rounds, team2_rounds, winner_id, is_forfeit
             FROM match_maps ORDER BY match_id, map_index",
        )?;
        let maps = stmt
            .query_map([], Self::row_to_map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(maps)
    }

    fn list_player_map_stats(&self, filter: &PlayerStatFilter) -> Result<Vec<PlayerMapStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT match_id, map_index, team_id, player_id, is_sub, subbed_for_id, agent, acs,
                    kills, deaths, assists
             FROM match_stats_map
             WHERE (?1 IS NULL OR team_id = ?1)
               AND (?2 IS NULL OR match_id = ?2)
             ORDER BY match_id, map_index, id",
        )?;
        let stats = stmt
            .query_map(
                params![filter.team.map(|t| t.0), filter.match_id.map(|m| m.0)],
                Self::row_to_stat,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Roster lists are short; filter them here rather than building an IN clause
        Ok(stats.into_iter().filter(|s| filter.accepts(s)).collect())
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub player_count: usize,
    pub completed_matches: usize,
    pub scheduled_matches: usize,
    pub model_versions: usize,
    pub latest_week: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(db: &Database) -> (Team, Team) {
        let owls = db.create_team("Night Owls", Some("NOW"), Some("ALPHA")).unwrap();
        let foxes = db.create_team("Red Foxes", Some("RFX"), Some("ALPHA")).unwrap();
        (owls, foxes)
    }

    fn scheduled(id: i64, week: u32, t1: TeamId, t2: TeamId) -> Match {
        Match {
            id: MatchId(id),
            week,
            group: Some("ALPHA".to_string()),
            team1: t1,
            team2: t2,
            match_type: MatchType::Regular,
            status: MatchStatus::Scheduled,
            score_t1: 0,
            score_t2: 0,
            winner: None,
            format: Some(SeriesFormat::Bo1),
            maps_played: 0,
            is_forfeit: false,
        }
    }

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.team_count, 0);
        assert_eq!(stats.completed_matches, 0);
        assert_eq!(stats.latest_week, None);
    }

    #[test]
    fn test_find_team_by_name_or_tag() {
        let db = Database::in_memory().unwrap();
        let (owls, _) = seed(&db);
        assert_eq!(db.find_team_by_name("night owls").unwrap(), Some(owls.clone()));
        assert_eq!(db.find_team_by_name("now").unwrap(), Some(owls));
        assert_eq!(db.find_team_by_name("nobody").unwrap(), None);
        assert!(matches!(
            db.get_team(TeamId(99)),
            Err(LeagueError::UnknownTeam(TeamId(99)))
        ));
    }

    #[test]
    fn test_match_round_trip_and_filters() {
        let db = Database::in_memory().unwrap();
        let (owls, foxes) = seed(&db);
        db.upsert_match(&scheduled(1, 1, owls.id, foxes.id)).unwrap();
        let mut playoff = scheduled(2, 9, foxes.id, owls.id);
        playoff.match_type = MatchType::Playoff;
        db.upsert_match(&playoff).unwrap();

        assert_eq!(db.get_match(MatchId(1)).unwrap(), scheduled(1, 1, owls.id, foxes.id));
        assert_eq!(db.list_matches(MatchFilter::all()).unwrap().len(), 2);
        assert_eq!(db.list_matches(MatchFilter::regular()).unwrap().len(), 1);
        assert_eq!(db.list_scheduled_matches().unwrap().len(), 2);
        assert!(db.list_matches(MatchFilter::completed()).unwrap().is_empty());
    }

    #[test]
    fn test_record_result_derives_winner() {
        let db = Database::in_memory().unwrap();
        let (owls, foxes) = seed(&db);
        db.upsert_match(&scheduled(1, 1, owls.id, foxes.id)).unwrap();

        let entry = ScoreEntry {
            score_t1: 0,
            score_t2: 0,
            maps: vec![MatchMap {
                match_id: MatchId(1),
                map_index: 0,
                map_name: "Bind".to_string(),
                team1_rounds: 9,
                team2_rounds: 13,
                winner: Some(foxes.id),
                is_forfeit: false,
            }],
            ..Default::default()
        };
        let record = db.record_result(MatchId(1), &entry).unwrap();
        assert_eq!(record.status, MatchStatus::Completed);
        assert_eq!(record.winner, Some(foxes.id));
        assert_eq!(record.maps_played, 1);

        let maps = db.list_match_maps(MatchId(1)).unwrap();
        assert_eq!(maps.len(), 1);
        assert_eq!(maps[0].team2_rounds, 13);
        assert_eq!(db.get_stats().unwrap().completed_matches, 1);
    }

    #[test]
    fn test_reentered_result_replaces_maps() {
        let db = Database::in_memory().unwrap();
        let (owls, foxes) = seed(&db);
        db.upsert_match(&scheduled(1, 1, owls.id, foxes.id)).unwrap();

        let map = |index: u32, name: &str, r1: u32, r2: u32| MatchMap {
            match_id: MatchId(1),
            map_index: index,
            map_name: name.to_string(),
            team1_rounds: r1,
            team2_rounds: r2,
            winner: Some(if r1 > r2 { owls.id } else { foxes.id }),
            is_forfeit: false,
        };
        let first = ScoreEntry {
            maps: vec![map(0, "Bind", 5, 13), map(1, "Haven", 13, 11)],
            ..Default::default()
        };
        db.record_result(MatchId(1), &first).unwrap();
        assert_eq!(db.list_match_maps(MatchId(1)).unwrap().len(), 2);

        let fewer = ScoreEntry {
            maps: vec![map(0, "Bind", 5, 13)],
            ..Default::default()
        };
        db.record_result(MatchId(1), &fewer).unwrap();
        assert_eq!(db.list_match_maps(MatchId(1)).unwrap().len(), 1);

        let forfeit = ScoreEntry {
            score_t1: 13,
            score_t2: 0,
            is_forfeit: true,
            ..Default::default()
        };
        let record = db.record_result(MatchId(1), &forfeit).unwrap();
        assert_eq!(record.winner, Some(owls.id));
        assert_eq!(record.maps_played, 0);
        assert!(db.list_match_maps(MatchId(1)).unwrap().is_empty());

        let snapshot = LeagueSnapshot::load(&db).unwrap();
        let (tables, _) =
            crate::standings::standings_for(&snapshot, &crate::StandingsConfig::default())
                .unwrap();
        let points = |team: TeamId| {
            tables["ALPHA"]
                .iter()
                .find(|r| r.team == team)
                .map(|r| r.points)
        };
        assert_eq!(points(owls.id), Some(15));
        assert_eq!(points(foxes.id), Some(0));
    }

    #[test]
    fn test_record_result_rejects_foreign_winner() {
        let db = Database::in_memory().unwrap();
        let (owls, foxes) = seed(&db);
        db.upsert_match(&scheduled(1, 1, owls.id, foxes.id)).unwrap();
        let entry = ScoreEntry {
            score_t1: 13,
            score_t2: 2,
            winner: Some(TeamId(42)),
            ..Default::default()
        };
        assert!(matches!(
            db.record_result(MatchId(1), &entry),
            Err(LeagueError::InvalidWinner { .. })
        ));
    }

    #[test]
    fn test_import_snapshot_matches_repository_reads() {
        let snapshot = LeagueSnapshot::from_json(
            r#"{
                "teams": [
                    {"id": 1, "name": "Night Owls", "group": "ALPHA"},
                    {"id": 2, "name": "Red Foxes", "group": "ALPHA"}
                ],
                "players": [{"id": 5, "name": "vex", "default_team": 1}],
                "matches": [
                    {"id": 10, "week": 1, "team1": 1, "team2": 2, "match_type": "regular",
                     "status": "completed", "score_t1": 13, "score_t2": 9, "winner": 1,
                     "format": "BO1", "maps_played": 1}
                ],
                "maps": [{"match_id": 10, "map_index": 0, "map_name": "Ascent",
                          "team1_rounds": 13, "team2_rounds": 9, "winner": 1}],
                "player_stats": [
                    {"match_id": 10, "map_index": 0, "team": 1, "player": 5, "acs": 250,
                     "kills": 20, "deaths": 11}
                ]
            }"#,
        )
        .unwrap();

        let db = Database::in_memory().unwrap();
        let summary = db.import_snapshot(&snapshot).unwrap();
        assert_eq!(summary.matches, 1);
        assert_eq!(summary.player_stats, 1);

        // Importing twice replaces stat lines instead of duplicating them
        db.import_snapshot(&snapshot).unwrap();

        let loaded = LeagueSnapshot::load(&db).unwrap();
        assert_eq!(loaded.matches, snapshot.matches);
        assert_eq!(loaded.maps, snapshot.maps);
        assert_eq!(loaded.player_stats, snapshot.player_stats);
        assert_eq!(loaded.players, snapshot.players);

        let by_player = db
            .list_player_map_stats(&PlayerStatFilter::for_players(vec![PlayerId(5)]))
            .unwrap();
        assert_eq!(by_player.len(), 1);
        let by_team = db
            .list_player_map_stats(&PlayerStatFilter::for_team(TeamId(2)))
            .unwrap();
        assert!(by_team.is_empty());
    }
}
