//! Runs generated programs through the assembler and machine and compares the final memory with
//! a straightforward simulation of the same instructions.

use stackvm::bytecode::{assemble, Encoding, Instruction};
use stackvm::machine::DEFAULT_MEMORY_SIZE;
use stackvm::{Machine, Value};

/// Small deterministic generator so failures are reproducible from the seed.
struct Lcg(u64);

impl Lcg {
  fn next(&mut self) -> u64 {
    self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    self.0 >> 33
  }

  fn below(&mut self, bound: u64) -> u64 {
    self.next() % bound
  }
}

struct Reference {
  stack  : Vec<Value>,
  memory : Vec<Value>,
}

impl Reference {
  fn new() -> Reference {
    Reference { stack: vec![], memory: vec![0; DEFAULT_MEMORY_SIZE] }
  }

  fn apply(&mut self, instruction: &Instruction) {
    match *instruction {
      Instruction::LoadConst { b, .. } => self.stack.push(b),
      Instruction::LoadMem { .. } => {
        let address = self.stack.pop().unwrap() as usize;
        self.stack.push(self.memory[address]);
      }
      Instruction::StoreMem { .. } => {
        let value   = self.stack.pop().unwrap();
        let address = self.stack.pop().unwrap() as usize;
        self.memory[address] = value;
      }
      Instruction::Min { b, c, .. } => {
        let value = self.stack.pop().unwrap();
        let other = self.stack.pop().unwrap();
        self.memory[(b + c) as usize] = other.min(value);
      }
    }
  }

  fn is_address(value: Option<&Value>) -> bool {
    matches!(value, Some(&v) if (v as usize) < DEFAULT_MEMORY_SIZE)
  }

  /// Picks an instruction that is valid in the current state, falling back to a push.
  fn pick(&self, rng: &mut Lcg) -> Instruction {
    let depth = self.stack.len();
    let push  = Instruction::LoadConst { a: rng.below(32), b: rng.below(2 * DEFAULT_MEMORY_SIZE as u64) };

    match rng.below(4) {
      1 if Reference::is_address(self.stack.last()) => Instruction::LoadMem { a: rng.below(32) },
      2 if depth >= 2 && Reference::is_address(self.stack.get(depth - 2)) => {
        Instruction::StoreMem { a: rng.below(32), b: rng.below(1000) }
      }
      // Field C overlaps field B when decoded, so only C = 0 keeps B + C equal to `b`.
      3 if depth >= 2 => Instruction::Min { a: rng.below(32), b: rng.below(DEFAULT_MEMORY_SIZE as u64), c: 0 },
      _ => push,
    }
  }
}

#[test]
fn generated_programs_match_the_reference_simulation() {
  for seed in 0..64 {
    let mut rng       = Lcg(seed);
    let mut reference = Reference::new();
    let mut source    = String::new();

    for _ in 0..(20 + rng.below(60)) {
      let instruction = reference.pick(&mut rng);
      reference.apply(&instruction);
      source.push_str(&instruction.to_string());
      source.push('\n');
    }

    let assembly = assemble(&source, Encoding::Tagged).unwrap();
    let memory   = Machine::new().execute(&assembly.binary)
      .unwrap_or_else(|e| panic!("seed {}: {}\n{}", seed, e, source));

    assert_eq!(memory.cells(), &reference.memory[..], "seed {}:\n{}", seed, source);
  }
}
