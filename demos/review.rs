use chrono::{DateTime, Duration, Utc};
use memory_transition::{
    Grade, MemoryState, RetentionScheduler, RetentionSignals, ReviewEngine, ReviewStepInput,
    ReviewTiming,
};

struct Card {
    due: DateTime<Utc>,
    memory_state: MemoryState,
    last_review: DateTime<Utc>,
}

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn review_on_time(engine: &ReviewEngine) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = RetentionScheduler::from_curve(*engine.forgetting_curve());

    // Reviewed 7 days ago, scheduled for today
    let mut card = Card {
        due: Utc::now(),
        last_review: Utc::now() - Duration::days(7),
        memory_state: MemoryState::new(7.0, 5.0, 7.0).with_scheduled_days(7.0),
    };

    // Preview every answer button
    let input = ReviewStepInput::new(card.memory_state, Grade::Good, Utc::now());
    let next_states = engine.next_states(&input, &scheduler)?;
    println!("Again interval: {} days", next_states.again.interval);
    println!("Hard interval: {} days", next_states.hard.interval);
    println!("Good interval: {} days", next_states.good.interval);
    println!("Easy interval: {} days", next_states.easy.interval);

    // Assume the card was answered `good`
    let result = next_states.good;
    card.memory_state = result.memory_state(card.memory_state.difficulty);
    card.last_review = Utc::now();
    card.due = result.due;

    println!("Next review due: {}", card.due);
    println!("Last review: {}", card.last_review);
    println!("Memory state: {:?}", card.memory_state);
    Ok(())
}

fn review_under_load(engine: &ReviewEngine) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = RetentionScheduler::from_curve(*engine.forgetting_curve());
    let card = Card {
        due: Utc::now() - Duration::days(5),
        last_review: Utc::now() - Duration::days(15),
        memory_state: MemoryState::new(10.0, 6.5, 15.0).with_scheduled_days(10.0),
    };

    let input = ReviewStepInput {
        timing: ReviewTiming::default(),
        retention_signals: Some(RetentionSignals {
            backlog_size: 240,
            recent_failure_rate: 0.3,
            session_length: 45.0,
            daily_capacity: 100,
            due_today: 180,
            ..Default::default()
        }),
        reviews_in_session: 60,
        ..ReviewStepInput::new(card.memory_state, Grade::Hard, Utc::now())
    };
    let result = engine.review_step(&input, &scheduler)?;

    println!("Overdue since: {}", card.due);
    println!("Last review: {}", card.last_review);
    println!(
        "Effective elapsed days: {}, effective recall: {:.4}",
        result.elapsed_days, result.retrievability
    );
    println!(
        "New stability: {:.2} days, next review in {} days",
        result.stability, result.interval
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger()?;
    let engine = ReviewEngine::default();

    println!("Reviewing a card on time:");
    review_on_time(&engine)?;

    println!("\nReviewing an overdue card under a heavy backlog:");
    review_under_load(&engine)?;

    Ok(())
}
