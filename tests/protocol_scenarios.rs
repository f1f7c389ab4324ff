//! End-to-end exchanges between the driver and a simulated module.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dfplayer::{
    compute_checksum, Clock, Command, DeviceSelector, DfPlayer, DriverError, ErrorReason, Frame,
    ManualClock, MemoryTransport, NullObserver, PlayerConfig, Response, Transport, FRAME_LEN,
};

fn attached(config: PlayerConfig) -> (DfPlayer, MemoryTransport, ManualClock) {
    let transport = MemoryTransport::new();
    let clock = ManualClock::new();
    let mut player = DfPlayer::new(config)
        .with_clock(clock.clone())
        .with_observer(NullObserver);
    player.attach(transport.clone());
    (player, transport, clock)
}

/// Transport that stamps every write with the shared clock's time.
struct Stamping {
    inner: MemoryTransport,
    clock: ManualClock,
    stamps: Arc<Mutex<Vec<Duration>>>,
}

impl Transport for Stamping {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stamps.lock().unwrap().push(self.clock.now());
        self.inner.write_all(bytes)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.inner.bytes_available()
    }

    fn read_until(&mut self, delimiter: u8, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read_until(delimiter, buf)
    }
}

#[test]
fn test_volume_twenty_wire_bytes() {
    let (mut player, transport, _) = attached(PlayerConfig::default());
    player.set_volume(20).unwrap();

    let sum: u16 = 0xFF + 0x06 + 0x06 + 0x00 + 0x00 + 0x14;
    let [hi, lo] = 0u16.wrapping_sub(sum).to_be_bytes();
    assert_eq!(
        transport.written(),
        vec![0x7E, 0xFF, 0x06, 0x06, 0x00, 0x00, 0x14, hi, lo, 0xEF]
    );
}

#[test]
fn test_consecutive_sends_are_spaced_by_settle_delay() {
    let clock = ManualClock::new();
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let mut player = DfPlayer::new(PlayerConfig::default())
        .with_clock(clock.clone())
        .with_observer(NullObserver);
    player.attach(Stamping {
        inner: MemoryTransport::new(),
        clock: clock.clone(),
        stamps: stamps.clone(),
    });

    player.next().unwrap();
    player.set_volume(10).unwrap();
    player.pause().unwrap();
    player.play().unwrap();

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 4);
    for pair in stamps.windows(2) {
        assert!(
            pair[1] - pair[0] >= Duration::from_millis(20),
            "sends too close: {:?}",
            *stamps
        );
    }
    // The last send is also followed by a full wait before control returns.
    assert!(clock.now() - stamps[3] >= Duration::from_millis(20));
}

#[test]
fn test_configured_settle_delay_is_honoured() {
    let config = PlayerConfig {
        settle_delay_ms: 35,
        ..PlayerConfig::default()
    };
    let (mut player, _, clock) = attached(config);
    player.stop().unwrap();
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(35)]);
}

#[test]
fn test_error_reply_decodes_reason() {
    let frame = Frame::parse([0x7E, 0xFF, 0x06, 0x40, 0x00, 0x00, 0x04, 0xFE, 0xB7, 0xEF]);
    assert!(frame.is_well_formed());
    let response = Response::from(&frame);
    assert_eq!(response, Response::Error(ErrorReason::Checksum));
    assert_eq!(response.to_string(), "error: Checksum incorrect");
}

#[test]
fn test_folder_play_then_query_over_backlog() {
    let (mut player, transport, _) = attached(PlayerConfig::default());
    // Module chatter queued ahead of the actual reply.
    transport.push_frame(&Frame::build(Command::PlugIn, 2, 0).unwrap());
    transport.push_frame(&Frame::build(Command::QueryTfCurrent, 17, 0).unwrap());

    let track = player.play_track_from_dir(3, 1, true).unwrap();
    assert_eq!(track, Some(17));
    assert_eq!(
        player.last_response().map(Frame::command_byte),
        Some(Command::QueryTfCurrent.code())
    );
}

#[test]
fn test_flash_source_queries() {
    let (mut player, transport, _) =
        attached(PlayerConfig::default().with_device(DeviceSelector::Flash));
    transport.push_frame(&Frame::build(Command::QueryFlashCurrent, 0x0102, 0).unwrap());
    assert_eq!(player.get_current_track().unwrap(), 0x0102);

    player.count_total_files().unwrap();
    let frames = transport.written_frames();
    assert_eq!(frames[0].command_byte(), 0x4D);
    assert_eq!(frames[1].command_byte(), 0x49);
}

#[test]
fn test_query_without_reply_is_explicit() {
    let (mut player, _, _) = attached(PlayerConfig::default());
    let err = player.query_volume().unwrap_err();
    assert!(matches!(err, DriverError::NoResponse { command: 0x43 }));
    assert_eq!(err.to_string(), "no response to query 0x43");
}

#[test]
fn test_write_only_wiring() {
    let (mut player, transport, _) = attached(PlayerConfig::default().with_no_receive(true));
    transport.push_frame(&Frame::build(Command::QueryTfCurrent, 5, 0).unwrap());

    assert_eq!(player.play_track_from_dir(1, 1, false).unwrap(), None);
    assert!(player.get_current_track().is_err());
    assert_eq!(transport.pending(), FRAME_LEN);
    assert_eq!(transport.written_frames().len(), 2);
}

#[test]
fn test_every_sent_frame_is_well_formed() {
    let (mut player, transport, _) = attached(PlayerConfig::default());
    player.reset().unwrap();
    player.set_volume(30).unwrap();
    player.set_equalizer(dfplayer::Equalizer::Rock).unwrap();
    player.play_mode(dfplayer::PlayMode::Random).unwrap();
    player.set_single_loop(true).unwrap();
    player.play_track(2999).unwrap();
    player.play_advert(7).unwrap();
    player.count_track_in_dir(4).unwrap();
    player.volume_up().unwrap();
    player.volume_down().unwrap();
    player.previous().unwrap();
    player.get_status().unwrap();
    player.standby().unwrap();
    player.wake().unwrap();

    let frames = transport.written_frames();
    assert_eq!(frames.len(), 14);
    for frame in frames {
        assert!(frame.is_well_formed(), "{frame:?}");
        assert_eq!(frame.checksum(), compute_checksum(frame.as_bytes()));
    }
}
