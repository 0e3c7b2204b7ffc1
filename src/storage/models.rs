//! SQL conversions and row mappers for the storage layer

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;

use crate::cli::types::{PlayerId, Position, Week};
use crate::projection::types::{BaselineUsage, PlayerWeekRecord, ProjectionRow, Stat, StatLine};

impl ToSql for Position {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Position {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for PlayerId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PlayerId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(PlayerId::new)
    }
}

impl ToSql for Week {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.as_u16())))
    }
}

impl FromSql for Week {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        u16::try_from(raw)
            .map(Week::new)
            .map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

/// Columns `load_history` selects, in order.
pub(crate) const HISTORY_COLUMNS: [&str; 21] = [
    "playerID",
    "playerName",
    "team",
    "position",
    "opponent",
    "week_num",
    "pass_att",
    "pass_cmp",
    "pass_yd",
    "pass_td",
    "pass_int",
    "rush_att",
    "rush_yd",
    "rush_td",
    "rec_tgt",
    "rec",
    "rec_yd",
    "rec_td",
    "off_snp",
    "pts_ppr",
    "ease_factor",
];

pub(crate) const WEEK_INPUT_COLUMNS: [&str; 11] = [
    "playerID",
    "playerName",
    "team",
    "position",
    "opponent",
    "week_num",
    "rec_tgt_base",
    "rush_att_base",
    "pass_att_base",
    "off_snp_base",
    "ease_base",
];

pub(crate) const DEFENSE_COLUMNS: [&str; 3] = ["defense_team", "position", "ease_factor"];

/// First counting-stat column in `HISTORY_COLUMNS`.
const FIRST_STAT_COLUMN: usize = 6;

/// NULL stats stay marked missing on the record.
pub(crate) fn row_to_player_week(row: &Row) -> rusqlite::Result<PlayerWeekRecord> {
    let mut record = PlayerWeekRecord::blank(
        row.get(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get(3)?,
        row.get::<_, String>(4)?,
        row.get(5)?,
    );
    for (offset, stat) in Stat::ALL.into_iter().enumerate() {
        record.set_stat(stat, row.get(FIRST_STAT_COLUMN + offset)?);
    }
    record.pts_ppr = row.get(19)?;
    record.ease_factor = row.get(20)?;
    Ok(record)
}

pub(crate) fn row_to_baseline(row: &Row) -> rusqlite::Result<BaselineUsage> {
    Ok(BaselineUsage {
        player_id: row.get(0)?,
        player_name: row.get(1)?,
        team: row.get(2)?,
        position: row.get(3)?,
        opponent: row.get(4)?,
        week: row.get(5)?,
        rec_tgt: row.get(6)?,
        rush_att: row.get(7)?,
        pass_att: row.get(8)?,
        off_snp: row.get(9)?,
        ease_factor: row.get(10)?,
    })
}

pub(crate) fn row_to_projection(row: &Row) -> rusqlite::Result<ProjectionRow> {
    Ok(ProjectionRow {
        week: row.get(0)?,
        player_id: row.get(1)?,
        player_name: row.get(2)?,
        team: row.get(3)?,
        position: row.get(4)?,
        opponent: row.get(5)?,
        rank: row.get(6)?,
        mu: row.get(7)?,
        median: row.get(8)?,
        p10: row.get(9)?,
        p90: row.get(10)?,
        statline: StatLine {
            proj_pass_att: row.get(11)?,
            proj_pass_cmp: row.get(12)?,
            proj_pass_yd: row.get(13)?,
            proj_pass_td: row.get(14)?,
            proj_pass_int: row.get(15)?,
            proj_rush_att: row.get(16)?,
            proj_rush_yd: row.get(17)?,
            proj_rush_td: row.get(18)?,
            proj_rec_tgt: row.get(19)?,
            proj_rec: row.get(20)?,
            proj_rec_yd: row.get(21)?,
            proj_rec_td: row.get(22)?,
        },
    })
}
