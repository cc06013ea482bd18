//! Address dispatch throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gb_core::cartridge::{header_checksum, ROM_BANK_SIZE};
use gb_core::{GameBoy, SystemConfig};

fn mbc1_rom() -> Vec<u8> {
    let mut rom: Vec<u8> = (0..16 * ROM_BANK_SIZE).map(|i| i as u8).collect();
    rom[0x147] = 0x01;
    rom[0x148] = 0x03;
    rom[0x149] = 0x00;
    rom[0x14D] = header_checksum(&rom);
    rom
}

fn bench_read_sweep(c: &mut Criterion) {
    let gb = GameBoy::from_rom(&mbc1_rom(), SystemConfig { skip_boot_rom: true })
        .expect("valid rom");

    c.bench_function("read full address space", |b| {
        b.iter(|| {
            let mut sum = 0u32;
            for address in 0..=0xFFFFu16 {
                sum = sum.wrapping_add(gb.read(black_box(address)) as u32);
            }
            sum
        })
    });
}

fn bench_bank_switch(c: &mut Criterion) {
    let mut gb = GameBoy::from_rom(&mbc1_rom(), SystemConfig { skip_boot_rom: true })
        .expect("valid rom");

    c.bench_function("switch bank and read", |b| {
        b.iter(|| {
            let mut sum = 0u32;
            for bank in 1..16u8 {
                gb.write(0x2000, black_box(bank));
                sum = sum.wrapping_add(gb.read(0x4000) as u32);
            }
            sum
        })
    });
}

fn bench_oam_dma(c: &mut Criterion) {
    let mut gb = GameBoy::from_rom(&mbc1_rom(), SystemConfig { skip_boot_rom: true })
        .expect("valid rom");

    c.bench_function("oam dma", |b| b.iter(|| gb.write(0xFF46, black_box(0xC0))));
}

criterion_group!(benches, bench_read_sweep, bench_bank_switch, bench_oam_dma);
criterion_main!(benches);
