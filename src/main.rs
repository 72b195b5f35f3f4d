//! Front desk console
//!
//! Reads one command per line from stdin and prints JSON results:
//!
//! ```text
//! member <email> <name>
//! check-in <member_id> <class_id>
//! status <attendance_id> <attended|absent|cancelled> [notes]
//! record <member_id> <class_id> <rfc3339> <attended|absent|cancelled> [notes]
//! count <member_id>
//! roster <class_id> <YYYY-MM-DD>
//! history <member_id> [limit]
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use club_attendance::{
    adapters::{
        clock::SystemClock, database::memory::MemoryDatabase, member::memory::MemoryMemberStore,
    },
    commands::{
        check_in::CheckInRequest, class_roster::ClassRosterRequest,
        history::AttendanceHistoryRequest, monthly_count::MonthlyCountRequest,
        record_attendance::RecordAttendanceRequest,
        update_status::UpdateStatusRequest, DomainLogic,
    },
    config::Config,
    domain::{AttendanceStatus, Member},
    ports::clock::ClockPort,
    telemetry,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tower::ServiceExt;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type Domain = DomainLogic<MemoryDatabase, MemoryMemberStore, SystemClock>;

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env()?;
    telemetry::init(&config.log_filter);
    config.log_summary();
    tracing::info!("starting front desk");

    let members = Arc::new(MemoryMemberStore::default());
    let domain = DomainLogic::new(
        Arc::new(MemoryDatabase::default()),
        members.clone(),
        Arc::new(SystemClock),
        config.timezone,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match run(&domain, &members, line).await {
            Ok(output) => println!("{output}"),
            Err(e) => tracing::error!("{line}: {e}"),
        }
    }

    Ok(())
}

async fn run(domain: &Domain, members: &MemoryMemberStore, line: &str) -> Result<String, BoxError> {
    let mut args = line.split_whitespace();
    let command = args.next().unwrap_or_default();
    let output = match command {
        "member" => {
            let email = args.next().ok_or("missing email")?;
            let name = args.collect::<Vec<_>>().join(" ");
            let member = Member::new(email, name, SystemClock.now());
            members.upsert(member.clone())?;
            serde_json::json!({ "memberId": member.member_id })
        }
        "check-in" => {
            let req = CheckInRequest {
                member_id: uuid_arg(args.next())?,
                class_id: uuid_arg(args.next())?,
            };
            serde_json::to_value(domain.clone().oneshot(req).await?)?
        }
        "status" => {
            let attendance_id = uuid_arg(args.next())?;
            let status = args.next().ok_or("missing status")?.parse::<AttendanceStatus>()?;
            let notes = args.collect::<Vec<_>>().join(" ");
            let req = UpdateStatusRequest {
                attendance_id,
                status,
                notes: (!notes.is_empty()).then_some(notes),
            };
            serde_json::to_value(domain.clone().oneshot(req).await?)?
        }
        "record" => {
            let member_id = uuid_arg(args.next())?;
            let class_id = uuid_arg(args.next())?;
            let check_in_time =
                DateTime::parse_from_rfc3339(args.next().ok_or("missing check-in time")?)?
                    .with_timezone(&Utc);
            let status = args.next().ok_or("missing status")?.parse::<AttendanceStatus>()?;
            let notes = args.collect::<Vec<_>>().join(" ");
            let req = RecordAttendanceRequest {
                member_id,
                class_id,
                check_in_time,
                status,
                notes: (!notes.is_empty()).then_some(notes),
            };
            serde_json::to_value(domain.clone().oneshot(req).await?)?
        }
        "count" => {
            let req = MonthlyCountRequest {
                member_id: uuid_arg(args.next())?,
            };
            serde_json::json!({ "attended": domain.clone().oneshot(req).await? })
        }
        "roster" => {
            let class_id = uuid_arg(args.next())?;
            let day = NaiveDate::parse_from_str(args.next().ok_or("missing day")?, "%Y-%m-%d")?;
            let req = ClassRosterRequest { class_id, day };
            serde_json::to_value(domain.clone().oneshot(req).await?)?
        }
        "history" => {
            let member_id = uuid_arg(args.next())?;
            let limit = match args.next() {
                Some(limit) => limit.parse::<usize>()?,
                None => DEFAULT_HISTORY_LIMIT,
            };
            let req = AttendanceHistoryRequest { member_id, limit };
            serde_json::to_value(domain.clone().oneshot(req).await?)?
        }
        other => return Err(format!("unknown command: {other}").into()),
    };

    Ok(output.to_string())
}

fn uuid_arg(arg: Option<&str>) -> Result<Uuid, BoxError> {
    Ok(arg.ok_or("missing id")?.parse::<Uuid>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use speculoos::prelude::*;

    fn front_desk() -> (Domain, Arc<MemoryMemberStore>) {
        let members = Arc::new(MemoryMemberStore::default());
        let domain = DomainLogic::new(
            Arc::new(MemoryDatabase::default()),
            members.clone(),
            Arc::new(SystemClock),
            Tz::UTC,
        );
        (domain, members)
    }

    #[tokio::test]
    async fn test_record_command() -> Result<(), BoxError> {
        // GIVEN a registered member
        let (domain, members) = front_desk();
        let output = run(&domain, &members, "member ana@example.com Ana Lima").await?;
        let member: serde_json::Value = serde_json::from_str(&output)?;
        let member_id = member["memberId"].as_str().ok_or("no member id")?.to_string();

        // WHEN a coach records an attended session from the console
        let line = format!(
            "record {member_id} {} {} attended forgot to scan",
            Uuid::new_v4(),
            Utc::now().to_rfc3339()
        );
        let output = run(&domain, &members, &line).await?;

        // THEN the record is a manual override and counts for the month
        let record: serde_json::Value = serde_json::from_str(&output)?;
        assert_that!(record["manualOverride"].as_bool()).is_equal_to(Some(true));
        assert_that!(record["status"].as_str()).is_equal_to(Some("attended"));
        assert_that!(record["notes"].as_str()).is_equal_to(Some("forgot to scan"));
        let output = run(&domain, &members, &format!("count {member_id}")).await?;
        assert_that!(output.as_str()).is_equal_to(r#"{"attended":1}"#);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_command_bad_status() {
        let (domain, members) = front_desk();
        let line = format!(
            "record {} {} {} late",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now().to_rfc3339()
        );

        let res = run(&domain, &members, &line).await;

        assert_that!(res.map_err(|e| e.to_string()))
            .is_err()
            .is_equal_to("unknown attendance status: late".to_string());
    }
}
