#[cfg(test)]
mod tests {
    use crate::core::{FaderConfig, ReadyLevel, Timestamp, TrackId};
    use crate::player::{FaderPlayer, MediaCommand, MediaEvent, PlayerNotice, TrackAction, TransportState};
    use tokio::sync::broadcast;

    fn ms(value: u64) -> Timestamp {
        Timestamp::from_millis(value)
    }

    // Player with a 60s video that has reached play-through level
    fn ready_player() -> FaderPlayer {
        let mut player = FaderPlayer::new(&FaderConfig::default());
        player.start();
        player.handle_event(TrackId::Video, MediaEvent::DurationChanged(60.0), ms(0));
        player.handle_event(TrackId::Video, MediaEvent::ReadyLevelChanged(ReadyLevel::EnoughData), ms(0));
        player
    }

    fn drain(receiver: &mut broadcast::Receiver<PlayerNotice>) -> Vec<PlayerNotice> {
        let mut notices = Vec::new();
        while let Ok(notice) = receiver.try_recv() {
            notices.push(notice);
        }
        notices
    }

    fn plays(commands: &[MediaCommand], track: TrackId) -> usize {
        commands.iter().filter(|c| c.track == track && c.is_play()).count()
    }

    #[test]
    fn test_start_loads_tracks_and_centers_mix() {
        let mut player = FaderPlayer::new(&FaderConfig::default());
        let commands = player.start();

        assert_eq!(
            commands,
            vec![
                MediaCommand::new(TrackId::Video, TrackAction::Load),
                MediaCommand::new(TrackId::Music, TrackAction::Load),
                MediaCommand::new(TrackId::Sfx, TrackAction::Load),
                MediaCommand::new(TrackId::Music, TrackAction::SetVolume(0.5)),
                MediaCommand::new(TrackId::Sfx, TrackAction::SetVolume(0.5)),
            ]
        );
    }

    #[test]
    fn test_play_gated_on_readiness() {
        let mut player = FaderPlayer::new(&FaderConfig::default());
        let mut notices = player.subscribe();
        player.start();

        assert!(player.request_play_pause(ms(0)).is_empty());
        assert_eq!(player.transport_state(), TransportState::Paused);

        player.handle_event(TrackId::Video, MediaEvent::ReadyLevelChanged(ReadyLevel::FutureData), ms(10));
        assert_eq!(drain(&mut notices), vec![PlayerNotice::Ready]);

        let commands = player.request_play_pause(ms(20));
        let first_play = commands.iter().position(MediaCommand::is_play).expect("play expected");
        assert_eq!(commands[..first_play].iter().filter(|c| c.is_seek()).count(), 2);
        assert_eq!(plays(&commands, TrackId::Video), 1);
        assert_eq!(plays(&commands, TrackId::Music), 1);
        assert_eq!(plays(&commands, TrackId::Sfx), 1);
        assert!(player.playback_state().is_playing);
    }

    #[test]
    fn test_readiness_survives_stalls() {
        let mut player = ready_player();
        let mut notices = player.subscribe();

        for i in 0..3 {
            player.handle_event(TrackId::Video, MediaEvent::Stalled, ms(i * 100));
            player.handle_event(TrackId::Video, MediaEvent::ReadyLevelChanged(ReadyLevel::CurrentData), ms(i * 100));
            assert!(player.playback_state().is_ready);
            assert!(player.is_buffering());
            player.handle_event(TrackId::Video, MediaEvent::Recovered, ms(i * 100 + 50));
            assert!(!player.is_buffering());
        }

        let notices = drain(&mut notices);
        assert!(!notices.contains(&PlayerNotice::Ready));
        assert_eq!(notices.len(), 6);
    }

    #[test]
    fn test_rejected_follower_gets_bounded_attempts() {
        let mut player = ready_player();
        let mut notices = player.subscribe();

        let mut music_plays = plays(&player.request_play_pause(ms(0)), TrackId::Music);
        let mut now = 0;
        for _ in 0..8 {
            player.handle_event(TrackId::Music, MediaEvent::PlayRejected("NotAllowedError".into()), ms(now));
            now += 200;
            music_plays += plays(&player.advance(ms(now)), TrackId::Music);
        }

        assert_eq!(music_plays, 3);
        assert!(player.engine().is_silenced(TrackId::Music));
        assert!(player.playback_state().is_playing, "video keeps playing without audio");
        assert!(drain(&mut notices).contains(&PlayerNotice::TrackSilenced {
            track: TrackId::Music,
            reason: "NotAllowedError".to_string(),
        }));

        // A fresh user play clears the restriction
        player.request_play_pause(ms(now));
        let commands = player.request_play_pause(ms(now + 10));
        assert_eq!(plays(&commands, TrackId::Music), 1);
        assert!(!player.engine().is_silenced(TrackId::Music));
    }

    #[test]
    fn test_user_seek_suspends_correction_and_resumes() {
        let mut player = ready_player();
        player.request_play_pause(ms(0));

        let commands = player.request_seek_fraction(0.5);
        assert!(commands.contains(&MediaCommand::new(TrackId::Video, TrackAction::SeekTo(30.0))));
        assert!(player.playback_state().is_seeking);

        // Follower far off, but no competing seek while the master seeks
        player.handle_event(TrackId::Music, MediaEvent::PositionChanged(2.0), ms(1_000));
        let tick = player.handle_event(TrackId::Video, MediaEvent::PositionChanged(30.0), ms(1_000));
        assert!(tick.iter().all(|c| c.track != TrackId::Music));

        // Pause/seek echoes from the host must not stop the transport
        player.handle_event(TrackId::Video, MediaEvent::Paused, ms(1_000));
        assert!(player.playback_state().is_playing);

        let seeked = player.handle_event(TrackId::Video, MediaEvent::Seeked, ms(1_100));
        assert!(seeked.contains(&MediaCommand::new(TrackId::Music, TrackAction::SeekTo(30.0))));
        assert!(seeked.contains(&MediaCommand::new(TrackId::Sfx, TrackAction::SeekTo(30.0))));

        let resumed = player.advance(ms(1_200));
        assert_eq!(plays(&resumed, TrackId::Video), 1);
        assert_eq!(plays(&resumed, TrackId::Music), 1);
        assert_eq!(plays(&resumed, TrackId::Sfx), 1);
        assert!(!player.playback_state().is_seeking);
    }

    #[test]
    fn test_pause_during_seek_cancels_resume() {
        let mut player = ready_player();
        player.request_play_pause(ms(0));
        player.request_seek(20.0);
        player.handle_event(TrackId::Video, MediaEvent::Seeked, ms(100));

        player.request_play_pause(ms(150));
        assert_eq!(player.transport_state(), TransportState::Paused);

        let later = player.advance(ms(1_000));
        assert!(later.is_empty());
        assert!(!player.playback_state().is_seeking);
    }

    #[test]
    fn test_end_resets_followers_regardless_of_mix() {
        let mut player = ready_player();
        player.set_mix_level(0.9);
        player.request_play_pause(ms(0));

        let commands = player.handle_event(TrackId::Video, MediaEvent::PlaybackEnded, ms(60_000));

        for follower in TrackId::FOLLOWERS {
            assert!(commands.contains(&MediaCommand::new(follower, TrackAction::Pause)));
            assert!(commands.contains(&MediaCommand::new(follower, TrackAction::SeekTo(0.0))));
            assert_eq!(player.engine().track(follower).position, 0.0);
        }
        assert_eq!(player.transport_state(), TransportState::Paused);
        assert_eq!(player.mix_level(), 0.9);
    }

    #[test]
    fn test_master_stall_pauses_and_recovery_resumes_followers() {
        let mut player = ready_player();
        let mut notices = player.subscribe();
        player.request_play_pause(ms(0));
        player.handle_event(TrackId::Video, MediaEvent::PositionChanged(4.0), ms(100));

        let stalled = player.handle_event(TrackId::Video, MediaEvent::Stalled, ms(200));
        assert_eq!(
            stalled,
            vec![
                MediaCommand::new(TrackId::Music, TrackAction::Pause),
                MediaCommand::new(TrackId::Sfx, TrackAction::Pause),
            ]
        );
        assert!(player.playback_state().is_playing);

        let recovered = player.handle_event(TrackId::Video, MediaEvent::Recovered, ms(900));
        assert!(recovered.contains(&MediaCommand::new(TrackId::Music, TrackAction::SeekTo(4.0))));
        assert_eq!(plays(&recovered, TrackId::Music), 1);
        assert_eq!(plays(&recovered, TrackId::Sfx), 1);

        assert_eq!(
            drain(&mut notices),
            vec![
                PlayerNotice::Buffering { active: true },
                PlayerNotice::Buffering { active: false },
            ]
        );
    }

    #[test]
    fn test_host_started_video_brings_followers() {
        let mut player = ready_player();
        player.handle_event(TrackId::Video, MediaEvent::PositionChanged(7.5), ms(0));

        let commands = player.handle_event(TrackId::Video, MediaEvent::PlayStarted, ms(10));

        assert!(player.playback_state().is_playing);
        assert!(commands.contains(&MediaCommand::new(TrackId::Music, TrackAction::SeekTo(7.5))));
        assert_eq!(plays(&commands, TrackId::Video), 0);
        assert_eq!(plays(&commands, TrackId::Music), 1);
    }

    #[test]
    fn test_host_start_before_ready_is_paused() {
        let mut player = FaderPlayer::new(&FaderConfig::default());
        let mut notices = player.subscribe();
        player.start();
        player.handle_event(TrackId::Video, MediaEvent::ReadyLevelChanged(ReadyLevel::Metadata), ms(0));

        let commands = player.handle_event(TrackId::Video, MediaEvent::PlayStarted, ms(10));

        assert_eq!(commands, vec![MediaCommand::new(TrackId::Video, TrackAction::Pause)]);
        assert!(!player.playback_state().is_ready);
        assert_eq!(player.transport_state(), TransportState::Paused);
        assert!(drain(&mut notices).is_empty());

        // The user still cannot play until the video can play through
        assert!(player.request_play_pause(ms(20)).is_empty());
    }

    #[test]
    fn test_retry_bound_survives_seeks() {
        let mut player = ready_player();
        let mut music_plays = plays(&player.request_play_pause(ms(0)), TrackId::Music);
        let mut now = 0;

        for _ in 0..4 {
            player.handle_event(TrackId::Music, MediaEvent::PlayRejected("NotAllowedError".into()), ms(now));
            now += 200;
            music_plays += plays(&player.advance(ms(now)), TrackId::Music);

            music_plays += plays(&player.request_seek(10.0), TrackId::Music);
            music_plays += plays(&player.handle_event(TrackId::Video, MediaEvent::Seeked, ms(now)), TrackId::Music);
            now += 100;
            music_plays += plays(&player.advance(ms(now)), TrackId::Music);
        }

        assert_eq!(music_plays, 3);
        assert!(player.engine().is_silenced(TrackId::Music));
        assert!(player.playback_state().is_playing);
    }

    #[test]
    fn test_host_pause_stops_followers() {
        let mut player = ready_player();
        player.request_play_pause(ms(0));

        let commands = player.handle_event(TrackId::Video, MediaEvent::Paused, ms(500));

        assert_eq!(player.transport_state(), TransportState::Paused);
        assert!(commands.contains(&MediaCommand::new(TrackId::Music, TrackAction::Pause)));
        assert!(commands.contains(&MediaCommand::new(TrackId::Sfx, TrackAction::Pause)));
    }

    #[test]
    fn test_master_rejection_blocks_playback() {
        let mut player = ready_player();
        let mut notices = player.subscribe();
        player.request_play_pause(ms(0));

        player.handle_event(TrackId::Video, MediaEvent::PlayRejected("NotAllowedError".into()), ms(5));

        assert_eq!(player.transport_state(), TransportState::Paused);
        assert_eq!(
            drain(&mut notices),
            vec![PlayerNotice::PlaybackBlocked {
                reason: "NotAllowedError".to_string()
            }]
        );
    }

    #[test]
    fn test_instances_are_independent() {
        let mut first = ready_player();
        let second = FaderPlayer::new(&FaderConfig::default());

        first.request_play_pause(ms(0));

        assert_ne!(first.id(), second.id());
        assert!(first.playback_state().is_playing);
        assert!(!second.playback_state().is_playing);
        assert!(!second.playback_state().is_ready);
    }

    #[test]
    fn test_mix_level_applies_volumes() {
        let mut player = ready_player();
        let commands = player.set_mix_level(0.25);

        assert_eq!(
            commands,
            vec![
                MediaCommand::new(TrackId::Music, TrackAction::SetVolume(0.5)),
                MediaCommand::new(TrackId::Sfx, TrackAction::SetVolume(0.25)),
            ]
        );
        assert_eq!(player.volumes().sfx, 0.25);
    }
}
