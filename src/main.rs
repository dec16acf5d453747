// トレースファイルをメモリ上のページで再生してターミナルに表示する

use log::{error, info};
use maze_playback::{
    ManualTimer, MemoryPage, PlaybackConfig, PlaybackController, StepsData, init_logger,
    page_for_steps, parse_args, show_help,
};
use std::time::Duration;

fn print_frame(page: &MemoryPage, data: &StepsData) {
    for maze in data.mazes() {
        let status = page.status(&maze.title).unwrap_or("not started");
        println!("{} ({})", maze.title, status);
        match page.render_colored(&maze.title) {
            Some(text) => println!("{}", text),
            None => println!("  <no grid>\n"),
        }
    }
}

fn main() {
    let cli_args = parse_args();
    init_logger(&cli_args.log_level);

    if cli_args.show_help {
        show_help();
        return;
    }

    let Some(path) = cli_args.steps_path.as_ref() else {
        show_help();
        std::process::exit(2);
    };

    let data = match StepsData::from_file(path) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let mut page = page_for_steps(&data);
    let mut controller =
        PlaybackController::new(data.clone(), PlaybackConfig::default(), ManualTimer::new());

    if let Some(speed_ms) = cli_args.speed_ms {
        if let Err(e) = controller.set_speed(speed_ms, &mut page) {
            error!("{}", e);
        }
    }
    if let Err(e) = controller.toggle_playback(&mut page) {
        error!("Cannot start playback: {}", e);
        std::process::exit(1);
    }

    let max_ticks = cli_args.max_ticks.unwrap_or(usize::MAX);
    let mut ticks = 0usize;
    // 手動タイマーが生きている間だけ発火させる
    while controller.host().active().is_some() && ticks < max_ticks {
        controller.render_step(&mut page);
        ticks += 1;

        if cli_args.show_frames {
            print_frame(&page, &data);
        }
        if cli_args.animate {
            std::thread::sleep(Duration::from_millis(u64::from(controller.speed_ms())));
        }
    }

    if !cli_args.show_frames {
        print_frame(&page, &data);
    }
    info!(
        "Played {} ticks across {} mazes (finished: {})",
        ticks,
        data.len(),
        controller.is_finished()
    );
}
