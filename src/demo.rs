//! Built-in fallback data.
//!
//! Shown the moment the dashboard mounts and kept whenever the service
//! cannot supply something better. Deterministic and complete: every chart
//! series and metric card is populated.

use chrono::{TimeZone, Utc};

use crate::model::{
    ActivityShare, Goal, GoalStatus, HealthDataset, HeartRatePoint, Insight, InsightKind,
    MetricCard, Milestone, Priority, SleepPoint, StepPoint, Trend,
};

const STEP_GOAL: u32 = 10_000;

pub fn default_dataset() -> HealthDataset {
    let steps = [8432, 12456, 9876, 11234, 7654, 13456, 10987];
    let step_data = steps
        .iter()
        .enumerate()
        .map(|(i, &steps)| StepPoint {
            date: format!("2024-01-{:02}", i + 1),
            steps,
            goal: STEP_GOAL,
        })
        .collect();

    let heart = [
        ("00:00", 62, 85, 145),
        ("04:00", 58, 82, 142),
        ("08:00", 65, 95, 168),
        ("12:00", 68, 110, 175),
        ("16:00", 70, 105, 172),
        ("20:00", 64, 88, 155),
        ("24:00", 60, 80, 148),
    ];
    let heart_rate_data = heart
        .iter()
        .map(|&(time, resting, active, max)| HeartRatePoint {
            time: time.to_string(),
            resting,
            active,
            max,
        })
        .collect();

    let sleep = [
        ("Mon", 2.1, 4.2, 1.8, 0.3),
        ("Tue", 1.9, 4.5, 2.1, 0.2),
        ("Wed", 2.3, 3.8, 1.9, 0.4),
        ("Thu", 2.0, 4.1, 2.0, 0.3),
        ("Fri", 1.8, 4.3, 1.7, 0.5),
        ("Sat", 2.4, 4.0, 2.2, 0.2),
        ("Sun", 2.2, 4.4, 2.0, 0.3),
    ];
    let sleep_data = sleep
        .iter()
        .map(|&(date, deep, light, rem, awake)| SleepPoint {
            date: date.to_string(),
            deep,
            light,
            rem,
            awake,
        })
        .collect();

    let activity_distribution = [
        ("Cardio", 35, "#8884d8"),
        ("Strength", 25, "#82ca9d"),
        ("Flexibility", 20, "#ffc658"),
        ("Recovery", 20, "#ff7300"),
    ]
    .iter()
    .map(|&(name, value, color)| ActivityShare {
        name: name.to_string(),
        value,
        color: color.to_string(),
    })
    .collect();

    let health_metrics = [
        ("Steps", "10,987", "10,000", 109, Trend::Up, "+12%"),
        ("Heart Rate", "68 bpm", "60-100", 68, Trend::Stable, "+2%"),
        ("Sleep", "7h 32m", "8h", 94, Trend::Up, "+15%"),
        ("Calories", "2,240", "2,200", 102, Trend::Up, "+5%"),
        ("Hydration", "2.1L", "2.5L", 84, Trend::Down, "-8%"),
        ("Stress", "Low", "Optimal", 25, Trend::Down, "-20%"),
    ]
    .iter()
    .map(|&(title, value, target, progress, trend, change)| MetricCard {
        title: title.to_string(),
        value: value.to_string(),
        target: target.to_string(),
        progress,
        trend,
        change: change.to_string(),
    })
    .collect();

    HealthDataset {
        step_data,
        heart_rate_data,
        sleep_data,
        activity_distribution,
        health_metrics,
    }
}

pub fn default_insights() -> Vec<Insight> {
    vec![
        insight(
            InsightKind::Achievement,
            "Weekly Step Goal Achieved!",
            "You've walked 72,645 steps this week, exceeding your goal by 12%. Keep up the great work!",
            Priority::High,
        ),
        insight(
            InsightKind::Recommendation,
            "Optimize Your Sleep Schedule",
            "Your data shows you sleep best when going to bed before 10:30 PM. Try adjusting your bedtime for better recovery.",
            Priority::Medium,
        ),
        insight(
            InsightKind::Pattern,
            "Workout Performance Peak",
            "Your heart rate data indicates peak performance between 10-11 AM. Consider scheduling intense workouts during this window.",
            Priority::Medium,
        ),
        insight(
            InsightKind::Alert,
            "Hydration Below Target",
            "You're 16% below your hydration goal this week. Increase water intake to optimize recovery and performance.",
            Priority::Low,
        ),
    ]
}

/// Goals shown before the goal list has loaded.
pub fn default_goals() -> Vec<Goal> {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
    let created = created.unwrap_or_default();

    vec![
        Goal {
            id: "demo-steps".to_string(),
            title: "Daily 10K Steps".to_string(),
            description: "Walk at least 10,000 steps every day".to_string(),
            category: "fitness".to_string(),
            target_value: 10_000.0,
            current_value: 8_432.0,
            unit: "steps".to_string(),
            deadline: None,
            priority: Priority::High,
            status: GoalStatus::Active,
            created_at: created,
            milestones: vec![
                milestone("demo-steps-1", "5K steps", 5_000.0, true),
                milestone("demo-steps-2", "7.5K steps", 7_500.0, true),
                milestone("demo-steps-3", "10K steps", 10_000.0, false),
            ],
        },
        Goal {
            id: "demo-sleep".to_string(),
            title: "8 Hours of Sleep".to_string(),
            description: "Average 8 hours of sleep per night".to_string(),
            category: "sleep".to_string(),
            target_value: 8.0,
            current_value: 7.5,
            unit: "hours".to_string(),
            deadline: None,
            priority: Priority::Medium,
            status: GoalStatus::Active,
            created_at: created,
            milestones: vec![milestone("demo-sleep-1", "7 hours", 7.0, true)],
        },
    ]
}

fn insight(kind: InsightKind, title: &str, description: &str, priority: Priority) -> Insight {
    Insight {
        kind,
        title: title.to_string(),
        description: description.to_string(),
        priority,
    }
}

fn milestone(id: &str, title: &str, target: f64, completed: bool) -> Milestone {
    Milestone {
        id: id.to_string(),
        title: title.to_string(),
        target_value: target,
        completed,
        completed_at: None,
    }
}
