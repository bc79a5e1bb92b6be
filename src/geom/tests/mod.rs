mod test_grow_basic;
mod test_lattice_basic;
mod test_morph_basic;
