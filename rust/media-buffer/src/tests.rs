use std::sync::Arc;

use media_bytes::{AlignedBlock, AllocationPolicy};
use media_common_traits::memory_owner::{MemoryAllocation, MemoryOwner};

use crate::{
    DecryptConfig, DiscardPadding, MediaBuffer, SubsampleEntry, TimeDelta,
    decrypt_config::EncryptionPattern,
};

const KEY_ID: [u8; 16] = [0x11; 16];
const IV: [u8; 16] = [0x22; 16];

fn sample_buffer() -> MediaBuffer {
    MediaBuffer::copy_from_with_side_data(&[0x10, 0x20, 0x30], &[0xaa, 0xbb])
        .with_timestamp(TimeDelta::from_milliseconds(40))
        .with_duration(TimeDelta::from_milliseconds(20))
        .with_key_frame(true)
        .with_discard_padding(DiscardPadding::new(
            TimeDelta::from_microseconds(100),
            TimeDelta::from_microseconds(200),
        ))
}

fn assert_padding_zeroed(buffer: &MediaBuffer) {
    assert_eq!(
        buffer.allocated_size(),
        buffer.data_size() + MediaBuffer::PADDING_SIZE
    );
    assert_eq!(buffer.padding().len(), MediaBuffer::PADDING_SIZE);
    assert!(buffer.padding().iter().all(|&b| b == 0));
    assert!(buffer.data_buffer().is_aligned(MediaBuffer::ALIGNMENT));
}

#[test]
fn test_copy_from() {
    let buffer = MediaBuffer::copy_from(&[1, 2, 3]);
    assert!(!buffer.is_end_of_stream());
    assert_eq!(buffer.data_size(), 3);
    assert_eq!(buffer.data(), &[1, 2, 3]);
    assert_eq!(buffer.side_data_size(), 0);
    assert!(buffer.side_data().is_empty());
    assert_eq!(buffer.timestamp(), TimeDelta::ZERO);
    assert_eq!(buffer.duration(), TimeDelta::ZERO);
    assert!(!buffer.is_key_frame());
    assert!(buffer.discard_padding().is_empty());
    assert!(!buffer.is_encrypted());
    assert!(!buffer.is_external());
    assert_padding_zeroed(&buffer);
}

#[test]
fn test_copy_from_random_sizes() {
    fastrand::seed(4173502);
    for _ in 0..100 {
        let len = fastrand::usize(0..2048);
        let data: Vec<u8> = (0..len).map(|_| fastrand::u8(1..)).collect();
        let buffer = MediaBuffer::copy_from(&data);
        assert_eq!(buffer.data_size(), len);
        assert_eq!(buffer.data(), &data[..]);
        assert_eq!(&buffer.padded_data()[..len], &data[..]);
        assert_padding_zeroed(&buffer);
    }
}

#[test]
fn test_with_side_data() {
    let buffer = MediaBuffer::copy_from_with_side_data(&[0x10, 0x20], &[0xaa]);
    assert_eq!(buffer.side_data_size(), 1);
    assert_eq!(buffer.side_data(), &[0xaa]);
    assert_eq!(buffer.data_size(), 2);
    assert_eq!(buffer.data(), &[0x10, 0x20]);
    assert_padding_zeroed(&buffer);
}

#[test]
fn test_with_size() {
    let mut buffer = MediaBuffer::with_size(16);
    assert_eq!(buffer.data_size(), 16);
    assert_padding_zeroed(&buffer);

    buffer.data_mut().copy_from_slice(&[7; 16]);
    assert_eq!(buffer.data(), &[7; 16]);
    assert_padding_zeroed(&buffer);
}

#[test]
fn test_empty_is_not_end_of_stream() {
    let buffer = MediaBuffer::copy_from(&[]);
    assert!(!buffer.is_end_of_stream());
    assert_eq!(buffer.data_size(), 0);
    assert_padding_zeroed(&buffer);

    let buffer = MediaBuffer::copy_from_declared(None, 0).unwrap();
    assert!(!buffer.is_end_of_stream());
    assert_eq!(buffer.data_size(), 0);
    assert_padding_zeroed(&buffer);

    let buffer = MediaBuffer::copy_from_declared(Some(&[1, 2][..]), 0).unwrap();
    assert!(!buffer.is_end_of_stream());
    assert_eq!(buffer.data_size(), 0);
}

#[test]
fn test_copy_from_declared() {
    let buffer = MediaBuffer::copy_from_declared(Some(&[1, 2, 3, 4][..]), 3).unwrap();
    assert_eq!(buffer.data(), &[1, 2, 3]);
    assert_padding_zeroed(&buffer);

    let err = MediaBuffer::copy_from_declared(None, 5).unwrap_err();
    assert!(err.is_invalid_arg());

    let err = MediaBuffer::copy_from_declared(Some(&[1, 2][..]), 5).unwrap_err();
    assert!(err.is_invalid_arg());
}

#[test]
fn test_copy_from_declared_with_side_data() {
    let buffer =
        MediaBuffer::copy_from_declared_with_side_data(Some(&[1, 2][..]), 2, Some(&[9][..]), 1)
            .unwrap();
    assert_eq!(buffer.data(), &[1, 2]);
    assert_eq!(buffer.side_data(), &[9]);

    let buffer =
        MediaBuffer::copy_from_declared_with_side_data(Some(&[1][..]), 1, None, 0).unwrap();
    assert_eq!(buffer.side_data_size(), 0);

    assert!(MediaBuffer::copy_from_declared_with_side_data(None, 1, Some(&[9][..]), 1).is_err());
    assert!(MediaBuffer::copy_from_declared_with_side_data(Some(&[1][..]), 1, None, 1).is_err());
}

#[test]
fn test_end_of_stream() {
    let eos = MediaBuffer::end_of_stream();
    assert!(eos.is_end_of_stream());
    assert_eq!(eos.describe(), "EOS");
    assert!(eos.matches(&MediaBuffer::end_of_stream()));
    assert!(!eos.matches(&MediaBuffer::copy_from(&[])));
    assert!(!MediaBuffer::copy_from(&[]).matches(&eos));
}

#[test]
#[should_panic(expected = "end-of-stream")]
fn test_end_of_stream_set_timestamp_panics() {
    let mut eos = MediaBuffer::end_of_stream();
    eos.set_timestamp(TimeDelta::from_seconds(1));
}

#[test]
#[should_panic(expected = "end-of-stream")]
fn test_end_of_stream_data_panics() {
    MediaBuffer::end_of_stream().data_size();
}

#[test]
#[should_panic(expected = "end-of-stream")]
fn test_end_of_stream_builder_panics() {
    let _ = MediaBuffer::end_of_stream().with_key_frame(true);
}

#[test]
fn test_set_side_data() {
    let mut buffer = MediaBuffer::copy_from(&[1]);
    buffer.set_side_data(&[4, 5, 6]);
    assert_eq!(buffer.side_data_size(), 3);
    assert_eq!(buffer.side_data(), &[4, 5, 6]);

    buffer.set_side_data(&[7]);
    assert_eq!(buffer.side_data(), &[7]);

    buffer.set_side_data(&[]);
    assert_eq!(buffer.side_data_size(), 0);
    assert!(buffer.side_data().is_empty());
}

#[test]
fn test_set_side_data_declared() {
    let mut buffer = MediaBuffer::copy_from(&[1]);
    buffer.set_side_data_declared(Some(&[1, 2, 3][..]), 2).unwrap();
    assert_eq!(buffer.side_data(), &[1, 2]);

    // A zero size clears, whatever the bytes.
    buffer.set_side_data_declared(Some(&[1, 2, 3][..]), 0).unwrap();
    assert_eq!(buffer.side_data_size(), 0);

    buffer.set_side_data(&[8]);
    let err = buffer.set_side_data_declared(None, 4).unwrap_err();
    assert!(err.is_invalid_arg());
    assert_eq!(buffer.side_data(), &[8]);

    buffer.set_side_data_declared(None, 0).unwrap();
    assert_eq!(buffer.side_data_size(), 0);
}

#[test]
fn test_clear_side_data() {
    let mut buffer = MediaBuffer::copy_from_with_side_data(&[1], &[2]);
    buffer.clear_side_data();
    assert_eq!(buffer.side_data_size(), 0);
    assert_eq!(buffer.data(), &[1]);
}

#[test]
fn test_matches_reflexive() {
    let buffer = sample_buffer();
    assert!(buffer.matches(&buffer));
    assert!(buffer.matches(&sample_buffer()));
    assert!(buffer.matches(&buffer.clone()));
}

#[test]
fn test_matches_timestamp_scenario() {
    let a = MediaBuffer::copy_from(&[0x01, 0x02, 0x03]);
    let mut b = MediaBuffer::copy_from(&[0x01, 0x02, 0x03]);
    assert!(a.matches(&b));
    b.set_timestamp(TimeDelta::from_microseconds(1));
    assert!(!a.matches(&b));
}

#[test]
fn test_matches_detects_each_field() {
    let base = sample_buffer();
    let key_id_config = DecryptConfig::cenc(&KEY_ID, &IV, vec![]).unwrap();

    let mut variants = vec![
        sample_buffer().with_duration(TimeDelta::from_milliseconds(21)),
        sample_buffer().with_key_frame(false),
        sample_buffer().with_discard_padding(DiscardPadding::default()),
        sample_buffer().with_decrypt_config(key_id_config),
        MediaBuffer::copy_from_with_side_data(&[0x10, 0x20], &[0xaa, 0xbb]),
        MediaBuffer::copy_from_with_side_data(&[0x10, 0x20, 0x31], &[0xaa, 0xbb]),
        MediaBuffer::copy_from_with_side_data(&[0x10, 0x20, 0x30], &[0xaa, 0xbc]),
        MediaBuffer::copy_from_with_side_data(&[0x10, 0x20, 0x30], &[0xaa]),
        MediaBuffer::end_of_stream(),
    ];

    let mut changed_timestamp = sample_buffer();
    changed_timestamp.set_timestamp(TimeDelta::ZERO);
    variants.push(changed_timestamp);

    let mut changed_side_data = sample_buffer();
    changed_side_data.clear_side_data();
    variants.push(changed_side_data);

    for variant in &variants {
        assert!(!base.matches(variant), "{variant} should not match {base}");
        assert!(!variant.matches(&base), "{base} should not match {variant}");
    }
}

#[test]
fn test_matches_decrypt_config() {
    let config = DecryptConfig::cenc(&KEY_ID, &IV, vec![SubsampleEntry::new(1, 2)]).unwrap();
    let other = DecryptConfig::cenc(&KEY_ID, &IV, vec![SubsampleEntry::new(2, 1)]).unwrap();

    let a = sample_buffer().with_decrypt_config(config.clone());
    let b = sample_buffer().with_decrypt_config(config);
    let c = sample_buffer().with_decrypt_config(other);
    assert!(a.matches(&b));
    assert!(!a.matches(&c));
}

#[test]
fn test_zero_length_encrypted() {
    let config = DecryptConfig::cbcs(&KEY_ID, &IV, vec![], Some(EncryptionPattern::new(1, 9)))
        .unwrap();
    let buffer = MediaBuffer::copy_from(&[]).with_decrypt_config(config);
    assert!(buffer.is_encrypted());
    assert!(!buffer.is_end_of_stream());
    assert_eq!(buffer.data_size(), 0);
    assert!(buffer.decrypt_config().unwrap().has_pattern());
}

#[test]
fn test_describe() {
    let description = sample_buffer().describe();
    assert_eq!(
        description,
        "timestamp=40000 duration=20000 size=3 side_data_size=2 is_key_frame=true \
         encrypted=false discard_padding (us)=(100, 200)"
    );
    assert!(description.contains("timestamp="));
    assert!(description.contains("duration="));
    assert!(description.contains("size="));
}

#[test]
fn test_describe_encrypted() {
    let config = DecryptConfig::cenc(&KEY_ID, &IV, vec![SubsampleEntry::new(3, 0)]).unwrap();
    let buffer = MediaBuffer::copy_from(&[1, 2, 3]).with_decrypt_config(config.clone());
    let description = buffer.describe();
    assert!(description.contains(" encrypted=true "));
    assert!(description.ends_with(&format!(" decrypt={config}")));
    assert_eq!(buffer.to_string(), description);
}

#[test]
fn test_mutation_detaches_shared_instance() {
    let original = sample_buffer();
    let mut copy = original.clone();
    copy.set_timestamp(TimeDelta::from_seconds(3));
    copy.set_side_data(&[1]);

    assert_eq!(original.timestamp(), TimeDelta::from_milliseconds(40));
    assert_eq!(original.side_data(), &[0xaa, 0xbb]);
    assert_eq!(copy.timestamp(), TimeDelta::from_seconds(3));
    assert_eq!(copy.side_data(), &[1]);

    // The payload itself is still shared.
    assert_eq!(original.data().as_ptr(), copy.data().as_ptr());
}

#[test]
fn test_data_mut_on_shared_payload_copies() {
    let original = MediaBuffer::with_size(4);
    let mut copy = original.clone();
    copy.data_mut().copy_from_slice(&[1, 2, 3, 4]);
    assert_eq!(original.data(), &[0; 4]);
    assert_eq!(copy.data(), &[1, 2, 3, 4]);
    assert_padding_zeroed(&copy);
}

struct MappedRegion {
    block: AlignedBlock,
}

unsafe impl MemoryOwner for MappedRegion {
    fn memory(&self) -> MemoryAllocation {
        self.block.memory()
    }
}

#[test]
fn test_from_external() {
    let region = Arc::new(MappedRegion {
        block: AlignedBlock::copy_from_slice(&[5, 6, 7], AllocationPolicy::UNPADDED),
    });
    let buffer = MediaBuffer::from_external(region.clone()).unwrap();
    assert!(buffer.is_external());
    assert_eq!(buffer.data(), &[5, 6, 7]);
    assert_eq!(buffer.allocated_size(), 3);
    assert!(buffer.padding().is_empty());
    assert!(buffer.matches(&MediaBuffer::copy_from(&[5, 6, 7])));
    assert!(buffer.describe().contains("size=3"));

    assert_eq!(Arc::strong_count(&region), 2);
    let shared = buffer.clone();
    drop(buffer);
    assert_eq!(Arc::strong_count(&region), 2);
    drop(shared);
    assert_eq!(Arc::strong_count(&region), 1);
}

#[test]
fn test_from_external_empty() {
    let region = Arc::new(MappedRegion {
        block: AlignedBlock::allocate(0, AllocationPolicy::UNPADDED),
    });
    let err = MediaBuffer::from_external(region).unwrap_err();
    assert!(err.is_invalid_arg());
}

#[test]
fn test_data_mut_on_external_copies_into_padded_block() {
    let region = Arc::new(MappedRegion {
        block: AlignedBlock::copy_from_slice(&[5, 6], AllocationPolicy::UNPADDED),
    });
    let mut buffer = MediaBuffer::from_external(region.clone()).unwrap();
    buffer.data_mut()[0] = 9;
    assert!(!buffer.is_external());
    assert_eq!(buffer.data(), &[9, 6]);
    assert_eq!(region.block.as_slice(), &[5, 6]);
    assert_padding_zeroed(&buffer);
}

#[test]
fn test_typed_payload() {
    let samples = [0.25f32, -0.5, 0.75, 1.0];
    let buffer = MediaBuffer::copy_from(bytemuck::cast_slice(&samples[..]));
    assert_eq!(buffer.data_buffer().typed_data::<f32>(), &samples);
}

#[test]
fn test_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MediaBuffer>();
}
