//! Command-line front end for the chainwire codecs.
//!
//! # Usage
//! ```text
//! chainwire <command> [ARGS] [OPTIONS]
//! ```
//!
//! Network and log level come from `--network` / `CHAINWIRE_NETWORK` and
//! `CHAINWIRE_LOG`.

use chainwire::crypto::key_pair::{decode_pubkey, decode_seckey, encode_pubkey, encode_seckey};
use chainwire::crypto::network::{Network, NetworkParams};
use chainwire::crypto::subaddress::{
    address_of, decode_subaddress, encode_subaddress, mask_address_of,
};
use chainwire::types::asset::AssetId;
use chainwire::types::convert::bytes_to_prefixed_hex;
use chainwire::types::keys::{Pubkey, Seckey};
use chainwire::types::stream::{Primitive, Stream};
use chainwire::types::uint256::Uint256;
use chainwire::utils::log;
use chainwire::{debug, error};
use std::env;
use std::process;

/// Options shared by every command.
struct Options {
    network: Network,
    derivation: String,
    seed: Option<String>,
    args: Vec<String>,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("chainwire", String::as_str);

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(program);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    if let Err(value) = log::init_from_env("CHAINWIRE_LOG") {
        eprintln!("Ignoring unknown CHAINWIRE_LOG level: {value}");
    }

    let options = parse_options(&args[2..]);
    debug!("network {}", options.network);
    let params = options.network.params();

    let result = match args[1].as_str() {
        "keygen" => keygen(&options, params),
        "address" => address(&options, params),
        "decode-address" => decode_address(&options, params),
        "mask" => mask(&options, params),
        "asset" => asset(&options),
        "dump" => dump(&options),
        other => {
            eprintln!("Unknown command: {other}\n");
            print_usage(program);
            process::exit(1);
        }
    };

    if let Err(message) = result {
        error!("{message}");
        process::exit(1);
    }
}

fn parse_options(args: &[String]) -> Options {
    let mut network = env::var("CHAINWIRE_NETWORK").ok();
    let mut derivation = String::new();
    let mut seed = None;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("--network" | "--derivation" | "--seed") => {
                i += 1;
                let Some(value) = args.get(i) else {
                    eprintln!("{flag} requires an argument");
                    process::exit(1);
                };
                match flag {
                    "--network" => network = Some(value.clone()),
                    "--derivation" => derivation = value.clone(),
                    _ => seed = Some(value.clone()),
                }
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let network = match network.as_deref().map(str::parse::<Network>) {
        None => Network::default(),
        Some(Ok(network)) => network,
        Some(Err(e)) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    Options {
        network,
        derivation,
        seed,
        args: positional,
    }
}

fn arg<'a>(options: &'a Options, index: usize, name: &str) -> Result<&'a str, String> {
    options
        .args
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing <{name}> argument"))
}

/// Prints a new key set, or the key set derived from `--seed`.
fn keygen(options: &Options, params: &NetworkParams) -> Result<(), String> {
    let seckey = match &options.seed {
        Some(seed) => Seckey::from_seed(seed.as_bytes()),
        None => Seckey::generate(),
    };
    let pubkey = seckey.pubkey().ok_or("derived key has no public key")?;
    let seckey_text = encode_seckey(&seckey, params).ok_or("seckey encoding failed")?;
    let pubkey_text = encode_pubkey(&pubkey, params).ok_or("pubkey encoding failed")?;
    let pkh = pubkey.pubkeyhash();
    let address = encode_subaddress(&pkh, &options.derivation, params)
        .ok_or("address encoding failed")?;

    println!("seckey:  {seckey_text}");
    println!("pubkey:  {pubkey_text}");
    println!("address: {address}");
    Ok(())
}

/// Address of an encoded public or secret key.
fn address(options: &Options, params: &NetworkParams) -> Result<(), String> {
    let text = arg(options, 0, "key")?;
    let pubkey: Pubkey = match decode_pubkey(text, params) {
        Some(pubkey) => pubkey,
        None => decode_seckey(text, params)
            .and_then(|seckey| seckey.pubkey())
            .ok_or_else(|| format!("not a {} key: {text}", params.name))?,
    };
    let address = if options.derivation.is_empty() {
        address_of(&pubkey, params)
    } else {
        encode_subaddress(&pubkey.pubkeyhash(), &options.derivation, params)
    };
    println!("{}", address.ok_or("address encoding failed")?);
    Ok(())
}

fn decode_address(options: &Options, params: &NetworkParams) -> Result<(), String> {
    let text = arg(options, 0, "address")?;
    let sub = decode_subaddress(text, params)
        .ok_or_else(|| format!("not a {} address: {text}", params.name))?;
    println!("pubkeyhash: {}", sub.base_pubkeyhash());
    if !sub.derivation_hash().is_zero() {
        println!("masked:     {}", sub.masked());
        println!("derivation: {}", sub.derivation_hash());
    }
    Ok(())
}

fn mask(options: &Options, params: &NetworkParams) -> Result<(), String> {
    let text = arg(options, 0, "address")?;
    let masked = mask_address_of(text, &options.derivation, params)
        .ok_or_else(|| format!("not a {} address: {text}", params.name))?;
    println!("{masked}");
    Ok(())
}

/// Accepts `CHAIN[:TOKEN[:CHECKSUM]]`, `CHAIN TOKEN CONTRACT`, or a numeric id.
fn asset(options: &Options) -> Result<(), String> {
    let first = arg(options, 0, "asset")?;
    let asset = match options.args.len() {
        1 => first
            .parse::<Uint256>()
            .ok()
            .and_then(|id| AssetId::from_id(&id))
            .or_else(|| AssetId::parse(first)),
        2 => Some(AssetId::from_handle(first, Some(&options.args[1]), None)),
        _ => Some(AssetId::from_handle(
            first,
            Some(&options.args[1]),
            Some(&options.args[2]),
        )),
    }
    .ok_or_else(|| format!("invalid asset: {first}"))?;

    println!("handle: {asset}");
    println!("id:     {}", asset.id());
    println!("hex:    {}", asset.to_hex());
    println!("valid:  {}", asset.is_valid());
    Ok(())
}

/// Walks a hex stream and prints each tagged value with its offset.
fn dump(options: &Options) -> Result<(), String> {
    let text = arg(options, 0, "hex")?;
    let mut stream = Stream::from_hex(text).ok_or_else(|| format!("not hex: {text}"))?;
    while !stream.is_finished() {
        let offset = stream.seek();
        let value = stream
            .read_primitive()
            .map_err(|e| format!("at offset {offset}: {e}"))?;
        let shown = match value {
            Primitive::Decimal(d) => format!("decimal {d}"),
            Primitive::Bool(b) => format!("bool    {b}"),
            Primitive::Uint(n) => format!("uint    {n}"),
            Primitive::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(s) => format!("string  {s:?}"),
                Err(e) => format!("bytes   {}", bytes_to_prefixed_hex(e.as_bytes())),
            },
            Primitive::HexBytes(bytes) => format!("hex     {}", bytes_to_prefixed_hex(&bytes)),
        };
        println!("{offset:>6}  {shown}");
    }
    Ok(())
}

const USAGE: &str = "\
Chainwire codec tool

USAGE:
    {program} <command> [ARGS] [OPTIONS]

COMMANDS:
    keygen                      Generate a key set (deterministic with --seed)
    address <key>               Address of an encoded public or secret key
    decode-address <address>    Show the public-key hash behind an address
    mask <address>              Re-derive an address under --derivation
    asset <handle|id>           Show an asset handle and its numeric id
    asset <chain> <token> [contract]
    dump <hex>                  Print each value of an encoded stream

OPTIONS:
    --network <name>       mainnet, testnet or regtest (default mainnet)
    --derivation <text>    Subaddress derivation data (default none)
    --seed <text>          Seed for deterministic keygen
    -h, --help             Print this help message

ENVIRONMENT:
    CHAINWIRE_NETWORK    Default network
    CHAINWIRE_LOG        Log level: debug, info, warn, error or off

EXAMPLES:
    {program} keygen --network testnet --seed demo
    {program} mask cw1... --derivation invoice-17
    {program} asset ETH USDT 0xdac17f958d2ee523a2206206994597c13d831ec7
    {program} dump 090106
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
