use std::fs;
use std::path::Path;

fn atom_line(serial: usize, name: &str, res: &str, chain: char, num: isize, p: [f64; 3]) -> String {
    let element = name.chars().next().unwrap_or('C');
    format!(
        "ATOM  {:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00          {:>2}",
        serial, name, res, chain, num, p[0], p[1], p[2], element
    )
}

/// Ten-residue chain `A` with a Serine cap at residue 2 whose contacts to residues
/// 4, 5 and 6 form a C4 loop, followed by a water.
pub fn capped_structure() -> String {
    let mut lines = Vec::new();
    let mut serial = 1;
    let mut push = |name: &str, res: &str, num: isize, p: [f64; 3]| {
        lines.push(atom_line(serial, name, res, 'A', num, p));
        serial += 1;
    };
    for num in 1..=10 {
        match num {
            2 => {
                push("N", "SER", num, [0.0, 5.0, 5.0]);
                push("CA", "SER", num, [0.0, 5.0, 3.5]);
                push("C", "SER", num, [0.0, 6.0, 2.0]);
                push("O", "SER", num, [0.0, 10.0, 0.0]);
                push("CB", "SER", num, [0.0, 1.5, 0.0]);
                push("OG", "SER", num, [0.0, 0.0, 0.0]);
            }
            4 => {
                push("N", "ALA", num, [3.0, 0.0, 0.0]);
                push("H", "ALA", num, [2.0, 0.0, 0.0]);
                push("CA", "ALA", num, [4.0, -1.0, 0.0]);
                push("C", "ALA", num, [5.0, -2.0, 0.0]);
                push("O", "ALA", num, [6.0, -2.0, 0.0]);
                push("CB", "ALA", num, [4.0, -1.0, 1.5]);
            }
            5 => {
                push("N", "ALA", num, [0.0, 0.0, 3.1]);
                push("H", "ALA", num, [0.0, 0.0, 2.1]);
                push("CA", "ALA", num, [0.0, -1.0, 4.1]);
                push("C", "ALA", num, [0.0, -2.0, 5.1]);
                push("O", "ALA", num, [0.0, -2.0, 6.3]);
                push("CB", "ALA", num, [1.5, -1.0, 4.1]);
            }
            6 => {
                push("N", "ALA", num, [3.0, 10.0, 0.0]);
                push("H", "ALA", num, [2.0, 10.0, 0.0]);
                push("CA", "ALA", num, [4.0, 11.0, 0.0]);
                push("C", "ALA", num, [5.0, 12.0, 0.0]);
                push("O", "ALA", num, [6.0, 12.0, 0.0]);
                push("CB", "ALA", num, [4.0, 11.0, 1.5]);
            }
            _ => {
                let x = num as f64 * 5.0 - 5.0;
                for (k, name) in ["N", "CA", "C", "O", "CB", "CG"].iter().enumerate() {
                    push(*name, "LEU", num, [x + k as f64 * 0.8, -20.0, 0.0]);
                }
            }
        }
    }
    let water = atom_line(999, "O", "HOH", 'W', 201, [40.0, 40.0, 40.0]);
    lines.push(water.replacen("ATOM  ", "HETATM", 1));
    lines.join("\n") + "\nEND\n"
}

pub fn write_structure(dir: &Path, structure_id: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{}.pdb", structure_id)), content).unwrap();
}
