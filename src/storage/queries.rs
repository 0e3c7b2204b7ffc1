//! Table loaders, seed upserts and output writers

use rusqlite::{params, Transaction};
use std::collections::HashSet;
use tracing::{debug, info};

use super::models::{
    row_to_baseline, row_to_player_week, row_to_projection, DEFENSE_COLUMNS, HISTORY_COLUMNS,
    WEEK_INPUT_COLUMNS,
};
use super::schema::{ProjectionDatabase, DEFENSE_STRENGTH, PLAYER_WEEKS, PROJECTIONS, WEEK_INPUTS};
use crate::cli::types::{Position, Week};
use crate::core::cache::TableKey;
use crate::error::{ProjError, Result};
use crate::projection::regression::ModelSet;
use crate::projection::types::{
    BaselineUsage, DefenseStrength, PlayerWeekRecord, ProjectionRow, Stat,
};

impl ProjectionDatabase {
    /// Fail with `MissingColumn` if `table` lacks any of `required`.
    pub fn verify_columns(&self, table: &str, required: &[&str]) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", table))?;
        let present = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;

        match required.iter().find(|c| !present.contains(**c)) {
            Some(column) => Err(ProjError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Player-weeks up to and including `through_week` for the modeled
    /// positions, with the ease factor filled from `defense_strength` where
    /// the row lacks one.
    pub fn load_history(&self, through_week: Week) -> Result<Vec<PlayerWeekRecord>> {
        let key = TableKey::for_week(PLAYER_WEEKS, through_week);
        self.caches.history.get_or_load(&key, || {
            self.verify_columns(PLAYER_WEEKS, &HISTORY_COLUMNS)?;
            self.verify_columns(DEFENSE_STRENGTH, &DEFENSE_COLUMNS)?;

            let mut stmt = self.conn.prepare(
                "SELECT pw.playerID, pw.playerName, pw.team, pw.position, pw.opponent,
                        pw.week_num, pw.pass_att, pw.pass_cmp, pw.pass_yd, pw.pass_td,
                        pw.pass_int, pw.rush_att, pw.rush_yd, pw.rush_td, pw.rec_tgt,
                        pw.rec, pw.rec_yd, pw.rec_td, pw.off_snp, pw.pts_ppr,
                        COALESCE(pw.ease_factor, ds.ease_factor)
                 FROM player_weeks pw
                 LEFT JOIN defense_strength ds
                   ON ds.defense_team = pw.opponent AND ds.position = pw.position
                 WHERE pw.week_num <= ?
                   AND pw.position IN ('QB', 'RB', 'WR', 'TE')
                 ORDER BY pw.week_num, pw.playerID",
            )?;

            let records = stmt
                .query_map(params![through_week], row_to_player_week)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            debug!(rows = records.len(), through = %through_week, "Loaded player history");
            Ok(records)
        })
    }

    pub fn load_defense_strength(&self) -> Result<DefenseStrength> {
        let key = TableKey::new(DEFENSE_STRENGTH);
        self.caches.defense.get_or_load(&key, || {
            self.verify_columns(DEFENSE_STRENGTH, &DEFENSE_COLUMNS)?;

            let mut stmt = self
                .conn
                .prepare("SELECT defense_team, position, ease_factor FROM defense_strength")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?;

            let mut defense = DefenseStrength::new();
            for row in rows {
                let (team, position, ease) = row?;
                // Positions outside the modeled four are not ours to read
                if let Ok(position) = position.parse::<Position>() {
                    defense.insert(team, position, ease);
                }
            }
            Ok(defense)
        })
    }

    /// Baseline usage for `week`, ease filled from `defense_strength` when
    /// the row lacks one.
    pub fn load_week_inputs(&self, week: Week) -> Result<Vec<BaselineUsage>> {
        let key = TableKey::for_week(WEEK_INPUTS, week);
        self.caches.week_inputs.get_or_load(&key, || {
            self.verify_columns(WEEK_INPUTS, &WEEK_INPUT_COLUMNS)?;

            let mut stmt = self.conn.prepare(
                "SELECT wi.playerID, wi.playerName, wi.team, wi.position, wi.opponent,
                        wi.week_num, wi.rec_tgt_base, wi.rush_att_base, wi.pass_att_base,
                        wi.off_snp_base, COALESCE(wi.ease_base, ds.ease_factor)
                 FROM week_inputs wi
                 LEFT JOIN defense_strength ds
                   ON ds.defense_team = wi.opponent AND ds.position = wi.position
                 WHERE wi.week_num = ?
                   AND wi.position IN ('QB', 'RB', 'WR', 'TE')
                 ORDER BY wi.playerID",
            )?;

            let rows = stmt
                .query_map(params![week], row_to_baseline)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Stored projections for `week`, in rank order.
    pub fn load_projections(&self, week: Week) -> Result<Vec<ProjectionRow>> {
        let key = TableKey::for_week(PROJECTIONS, week);
        self.caches.projections.get_or_load(&key, || {
            let mut stmt = self.conn.prepare(
                "SELECT week_num, playerID, playerName, team, position, opponent, rank,
                        mu, median, p10, p90,
                        proj_pass_att, proj_pass_cmp, proj_pass_yd, proj_pass_td, proj_pass_int,
                        proj_rush_att, proj_rush_yd, proj_rush_td,
                        proj_rec_tgt, proj_rec, proj_rec_yd, proj_rec_td
                 FROM projections
                 WHERE week_num = ?
                 ORDER BY rank",
            )?;

            let rows = stmt
                .query_map(params![week], row_to_projection)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Most recent week with stored projections.
    pub fn latest_projection_week(&self) -> Result<Option<Week>> {
        let week = self
            .conn
            .query_row("SELECT MAX(week_num) FROM projections", [], |row| {
                row.get::<_, Option<Week>>(0)
            })?;
        Ok(week)
    }

    /// Insert or replace one historical player-week
    pub fn upsert_player_week(&mut self, record: &PlayerWeekRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO player_weeks
             (playerID, playerName, team, position, opponent, week_num,
              pass_att, pass_cmp, pass_yd, pass_td, pass_int,
              rush_att, rush_yd, rush_td, rec_tgt, rec, rec_yd, rec_td, off_snp,
              pts_ppr, ease_factor)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.player_id,
                record.player_name,
                record.team,
                record.position,
                record.opponent,
                record.week,
                record.stat(Stat::PassAtt),
                record.stat(Stat::PassCmp),
                record.stat(Stat::PassYd),
                record.stat(Stat::PassTd),
                record.stat(Stat::PassInt),
                record.stat(Stat::RushAtt),
                record.stat(Stat::RushYd),
                record.stat(Stat::RushTd),
                record.stat(Stat::RecTgt),
                record.stat(Stat::Rec),
                record.stat(Stat::RecYd),
                record.stat(Stat::RecTd),
                record.stat(Stat::OffSnp),
                record.pts_ppr,
                record.ease_factor,
            ],
        )?;
        self.caches.invalidate_table(PLAYER_WEEKS);
        Ok(())
    }

    pub fn upsert_defense_strength(
        &mut self,
        defense_team: &str,
        position: Position,
        ease_factor: f64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO defense_strength (defense_team, position, ease_factor)
             VALUES (?, ?, ?)",
            params![defense_team, position, ease_factor],
        )?;
        self.caches.invalidate_table(DEFENSE_STRENGTH);
        Ok(())
    }

    pub fn upsert_week_input(&mut self, baseline: &BaselineUsage) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO week_inputs
             (playerID, playerName, team, position, opponent, week_num,
              rec_tgt_base, rush_att_base, pass_att_base, off_snp_base, ease_base)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                baseline.player_id,
                baseline.player_name,
                baseline.team,
                baseline.position,
                baseline.opponent,
                baseline.week,
                baseline.rec_tgt,
                baseline.rush_att,
                baseline.pass_att,
                baseline.off_snp,
                baseline.ease_factor,
            ],
        )?;
        self.caches.invalidate_table(WEEK_INPUTS);
        Ok(())
    }

    /// Overwrite the coefficient and residual tables in one transaction.
    pub fn replace_model_outputs(&mut self, models: &ModelSet) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_model_outputs(&tx, models)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace every projection row for `week` in one transaction.
    pub fn replace_projections(&mut self, week: Week, rows: &[ProjectionRow]) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_projections(&tx, week, rows)?;
        tx.commit()?;

        self.caches
            .projections
            .invalidate(&TableKey::for_week(PROJECTIONS, week));
        Ok(())
    }

    /// Write a full run's models and projections in a single transaction,
    /// so a failure leaves the previous outputs untouched.
    pub fn replace_run_outputs(
        &mut self,
        models: &ModelSet,
        week: Week,
        rows: &[ProjectionRow],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_model_outputs(&tx, models)?;
        write_projections(&tx, week, rows)?;
        tx.commit()?;

        self.caches
            .projections
            .invalidate(&TableKey::for_week(PROJECTIONS, week));
        Ok(())
    }

    /// Stored coefficients for one position, intercept first.
    pub fn load_coefficients(&self, position: Position) -> Result<Vec<(String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT feature, coefficient FROM model_coefficients
             WHERE position = ?
             ORDER BY CASE feature WHEN 'intercept' THEN 0 ELSE 1 END, rowid",
        )?;
        let rows = stmt
            .query_map(params![position], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_residuals(&self, position: Position) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM model_residuals WHERE position = ?",
            params![position],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn write_model_outputs(tx: &Transaction<'_>, models: &ModelSet) -> Result<()> {
    tx.execute("DELETE FROM model_coefficients", [])?;
    tx.execute("DELETE FROM model_residuals", [])?;

    let mut insert_coef = tx.prepare(
        "INSERT INTO model_coefficients (position, feature, coefficient)
         VALUES (?, ?, ?)",
    )?;
    let mut insert_resid = tx.prepare(
        "INSERT INTO model_residuals (position, playerID, week_num, residual)
         VALUES (?, ?, ?, ?)",
    )?;

    let mut coefficients = 0usize;
    let mut residuals = 0usize;
    for (position, model) in &models.models {
        for (feature, coefficient) in model.coefficient_table() {
            insert_coef.execute(params![position, feature, coefficient])?;
            coefficients += 1;
        }
        for residual in &model.residuals {
            insert_resid.execute(params![
                position,
                residual.player_id,
                residual.week,
                residual.value
            ])?;
            residuals += 1;
        }
    }

    info!(coefficients, residuals, "Wrote model outputs");
    Ok(())
}

fn write_projections(tx: &Transaction<'_>, week: Week, rows: &[ProjectionRow]) -> Result<()> {
    tx.execute("DELETE FROM projections WHERE week_num = ?", params![week])?;

    let mut insert = tx.prepare(
        "INSERT INTO projections
         (week_num, playerID, playerName, team, position, opponent, rank,
          mu, median, p10, p90,
          proj_pass_att, proj_pass_cmp, proj_pass_yd, proj_pass_td, proj_pass_int,
          proj_rush_att, proj_rush_yd, proj_rush_td,
          proj_rec_tgt, proj_rec, proj_rec_yd, proj_rec_td)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;

    for row in rows {
        let s = &row.statline;
        insert.execute(params![
            week,
            row.player_id,
            row.player_name,
            row.team,
            row.position,
            row.opponent,
            row.rank,
            row.mu,
            row.median,
            row.p10,
            row.p90,
            s.proj_pass_att,
            s.proj_pass_cmp,
            s.proj_pass_yd,
            s.proj_pass_td,
            s.proj_pass_int,
            s.proj_rush_att,
            s.proj_rush_yd,
            s.proj_rush_td,
            s.proj_rec_tgt,
            s.proj_rec,
            s.proj_rec_yd,
            s.proj_rec_td,
        ])?;
    }

    info!(week = %week, rows = rows.len(), "Wrote projections");
    Ok(())
}
